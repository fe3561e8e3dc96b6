pub const VEC_SIZE: &str = "vecSize";
pub const ITEM_PREFIX: &str = "item";
pub const WHICH: &str = "which";
pub const DATA: &str = "data";
pub const PTR_WRAPPER: &str = "ptr_wrapper";
pub const ID: &str = "id";

pub fn item_key(index: usize) -> String {
    format!("{ITEM_PREFIX}{index}")
}
