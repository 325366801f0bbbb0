//! Fixed e-commerce taxonomy and the lookup tables built over it.
//!
//! The registry is built once and never mutated, so it can be shared behind an
//! `Arc` and read from any number of request handlers without locking.

use serde::Serialize;
use std::collections::HashMap;

/// One entry of the product taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    #[serde(rename = "category_id")]
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// Immutable id <-> name <-> metadata lookup.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    by_name: HashMap<String, u32>,
}

impl CategoryRegistry {
    /// The 32-category taxonomy the default classifier was trained on.
    pub fn ecommerce() -> Self {
        Self::build(TAXONOMY.iter().map(|&(name, display_name, description)| {
            (name.to_string(), display_name.to_string(), description.to_string())
        }))
    }

    /// Build a registry from `(name, display_name, description)` records.
    ///
    /// Ids are assigned by position. Duplicate names are rejected because the
    /// classifier's output labels are joined against `name`.
    pub fn from_records<I>(records: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String, String)>,
    {
        let records: Vec<_> = records.into_iter().collect();
        let mut seen = std::collections::HashSet::new();
        for (name, _, _) in &records {
            if !seen.insert(name.as_str()) {
                anyhow::bail!("duplicate category name '{name}' in taxonomy");
            }
        }
        Ok(Self::build(records))
    }

    fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, String, String)>,
    {
        let categories: Vec<Category> = records
            .into_iter()
            .enumerate()
            .map(|(id, (name, display_name, description))| Category {
                id: id as u32,
                name,
                display_name,
                description,
            })
            .collect();
        let by_name = categories
            .iter()
            .map(|c| (c.name.clone(), c.id))
            .collect();
        Self { categories, by_name }
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn info_of(&self, id: u32) -> Option<&Category> {
        self.categories.get(id as usize)
    }

    /// Same as [`info_of`](Self::info_of) but accepts any integer, so callers
    /// holding untrusted ids (negative, oversized) don't need to range-check.
    pub fn lookup(&self, id: i64) -> Option<&Category> {
        u32::try_from(id).ok().and_then(|id| self.info_of(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&Category> {
        self.id_of(name).and_then(|id| self.info_of(id))
    }

    /// All categories ordered by id.
    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

const TAXONOMY: [(&str, &str, &str); 32] = [
    ("electronics", "Electronics", "Televisions, cameras, audio speakers, headphones, home theater systems, drones, wearable devices, electronic accessories, chargers, cables, and consumer electronic gadgets"),
    ("computers_networking", "Computers & Networking", "Desktop computers, laptops, monitors, keyboards, mice, storage drives, RAM, graphics cards, networking routers, switches, printers, and computing components"),
    ("mobile_phones_tablets", "Mobile Phones & Tablets", "Smartphones, feature phones, tablets, e-readers, phone cases, screen protectors, power banks, SIM cards, and mobile device accessories"),
    ("fashion_clothing", "Fashion & Clothing", "Apparel and garments including tops, pants, dresses, skirts, suits, jackets, outerwear, underwear, activewear, uniforms, and clothing for men women and children"),
    ("shoes_footwear", "Shoes & Footwear", "Sneakers, boots, sandals, heels, loafers, slippers, sports shoes, formal shoes, shoe care products, insoles, and laces for men women and children"),
    ("bags_luggage", "Bags & Luggage", "Backpacks, handbags, suitcases, travel bags, laptop bags, messenger bags, duffel bags, trolley cases, wallets, clutches, and packing organizers"),
    ("watches", "Watches", "Wristwatches, luxury watches, digital watches, smartwatches, watch bands, watch tools, and watch storage boxes"),
    ("jewelry", "Jewelry", "Rings, necklaces, bracelets, earrings, brooches, anklets, gemstones, gold and silver jewelry, costume jewelry, and fine jewelry pieces"),
    ("fashion_accessories", "Fashion Accessories", "Sunglasses, hats, caps, scarves, gloves, belts, ties, keychains, hair clips, and wearable fashion accessories not classified as clothing or jewelry"),
    ("beauty_personal_care", "Beauty & Personal Care", "Skincare, makeup, cosmetics, hair care, fragrances, perfumes, oral care, bath and body products, shaving tools, grooming kits, and beauty devices"),
    ("health_wellness", "Health & Wellness", "Vitamins, dietary supplements, medical devices, first aid kits, health monitors, massage equipment, personal protective equipment, and wellness products"),
    ("sports_outdoors", "Sports & Outdoors", "Gym equipment, fitness gear, camping gear, hiking equipment, bicycles, fishing rods, yoga mats, sports balls, swimming goggles, and outdoor recreation products"),
    ("home_furniture", "Home Furniture", "Sofas, beds, tables, chairs, wardrobes, bookshelves, desks, cabinets, mattresses, shelving units, and indoor household furniture"),
    ("home_decor_lighting", "Home Decor & Lighting", "Wall art, picture frames, vases, candles, mirrors, rugs, curtains, throw pillows, ceiling lights, table lamps, floor lamps, and decorative items"),
    ("kitchen_dining", "Kitchen & Dining", "Cookware, pots, pans, knives, cutting boards, dinnerware, glassware, utensils, food storage containers, bakeware, and kitchen gadgets"),
    ("bedding_bath", "Bedding & Bath", "Bed sheets, pillows, blankets, comforters, duvet covers, towels, bathrobes, shower curtains, bath mats, and bathroom accessories"),
    ("large_appliances", "Large Appliances", "Refrigerators, washing machines, dryers, air conditioners, dishwashers, ovens, stoves, water heaters, and large household appliances"),
    ("small_appliances", "Small Appliances", "Blenders, coffee makers, toasters, microwaves, electric kettles, rice cookers, vacuum cleaners, irons, air fryers, and portable household appliances"),
    ("grocery_food", "Grocery & Food", "Packaged food, fresh produce, frozen food, snacks, beverages, cooking ingredients, spices, condiments, dairy, meat, seafood, and pantry staples"),
    ("baby_maternity", "Baby & Maternity", "Diapers, baby formula, feeding bottles, pacifiers, baby clothing, strollers, car seats, cribs, baby monitors, maternity wear, and infant care essentials"),
    ("toys_games", "Toys & Games", "Children's toys, board games, puzzles, action figures, dolls, building blocks, remote control vehicles, educational toys, stuffed animals, and play sets"),
    ("books_media", "Books & Media", "Physical books, novels, textbooks, comic books, manga, magazines, music CDs, vinyl records, movie DVDs, Blu-ray discs, and printed publications"),
    ("stationery_office_supplies", "Stationery & Office Supplies", "Pens, pencils, notebooks, paper, folders, staplers, desk organizers, calculators, whiteboards, and general office and school supplies"),
    ("pet_supplies", "Pet Supplies", "Pet food, treats, toys, grooming products, leashes, collars, pet beds, aquariums, cages, litter, and healthcare products for pets"),
    ("automotive_motorcycle", "Automotive & Motorcycle", "Car parts, motorcycle parts, tires, car electronics, dash cams, engine oil, car care products, seat covers, and vehicle maintenance tools"),
    ("tools_hardware", "Tools & Hardware", "Hand tools, power tools, drills, saws, screwdrivers, wrenches, fasteners, plumbing supplies, electrical supplies, and construction hardware"),
    ("garden_outdoor_living", "Garden & Outdoor Living", "Plants, seeds, gardening tools, pots, planters, lawn mowers, outdoor furniture, grills, barbecue accessories, and irrigation equipment"),
    ("musical_instruments", "Musical Instruments", "Guitars, pianos, keyboards, drums, violins, wind instruments, instrument strings, picks, amplifiers, and music recording equipment"),
    ("video_games_gaming", "Video Games & Gaming", "Gaming consoles, video games, gaming controllers, gaming headsets, gaming chairs, and gaming accessories designed specifically for video gaming"),
    ("software_digital_goods", "Software & Digital Goods", "Computer software, antivirus programs, operating systems, digital gift cards, e-books, online courses, and downloadable digital content"),
    ("arts_crafts", "Arts & Crafts", "Painting supplies, canvas, brushes, sewing kits, knitting yarn, scrapbooking materials, craft paper, glue guns, DIY project kits, and creative hobby materials"),
    ("industrial_commercial", "Industrial & Commercial", "Laboratory equipment, industrial machinery, safety gear, commercial supplies, packaging materials, janitorial products, and professional-grade tools"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecommerce_taxonomy_has_32_entries() {
        let registry = CategoryRegistry::ecommerce();
        assert_eq!(registry.len(), 32);
        assert_eq!(registry.info_of(0).unwrap().name, "electronics");
        assert_eq!(registry.info_of(31).unwrap().name, "industrial_commercial");
        assert!(registry.info_of(32).is_none());
    }

    #[test]
    fn test_name_and_id_round_trip() {
        let registry = CategoryRegistry::ecommerce();
        for category in registry.all() {
            assert_eq!(registry.id_of(&category.name), Some(category.id));
            assert_eq!(registry.info_of(category.id).unwrap().name, category.name);
        }
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let records = TAXONOMY
            .iter()
            .map(|&(n, d, s)| (n.to_string(), d.to_string(), s.to_string()));
        assert!(CategoryRegistry::from_records(records).is_ok());
    }

    #[test]
    fn test_unknown_keys_return_none() {
        let registry = CategoryRegistry::ecommerce();
        assert_eq!(registry.id_of("spaceships"), None);
        assert!(registry.lookup(-1).is_none());
        assert!(registry.lookup(i64::MAX).is_none());
        assert!(registry.by_name("Electronics").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let records = vec![
            ("a".to_string(), "A".to_string(), String::new()),
            ("a".to_string(), "A again".to_string(), String::new()),
        ];
        assert!(CategoryRegistry::from_records(records).is_err());
    }

    #[test]
    fn test_category_serializes_with_category_id_field() {
        let registry = CategoryRegistry::ecommerce();
        let json = serde_json::to_value(registry.info_of(0).unwrap()).unwrap();
        assert_eq!(json["category_id"], 0);
        assert_eq!(json["display_name"], "Electronics");
    }
}
