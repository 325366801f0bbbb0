pub mod xlm_roberta;
