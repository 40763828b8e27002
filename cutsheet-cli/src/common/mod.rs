pub mod scenario;
pub mod util;

pub use util::{SelectionInput, load_selections, load_seller_config, split_csv};
