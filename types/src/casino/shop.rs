/// Static definition of something the shop sells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShopItem {
    pub name: &'static str,
    pub description: &'static str,
    pub price: u64,
    /// Units available per process lifetime, or `None` when unlimited.
    pub stock: Option<u32>,
}

pub const SHOP: [ShopItem; 5] = [
    ShopItem {
        name: "Small Luck Boost",
        description: "A charm for the superstitious gambler.",
        price: 500,
        stock: None,
    },
    ShopItem {
        name: "Big Luck Boost",
        description: "A bigger charm. Results not guaranteed.",
        price: 2_000,
        stock: None,
    },
    ShopItem {
        name: "Fishing Rod",
        description: "Sturdy enough for the river behind the arcade.",
        price: 300,
        stock: None,
    },
    ShopItem {
        name: "VIP Pass",
        description: "Bragging rights in the members lounge.",
        price: 10_000,
        stock: Some(10),
    },
    ShopItem {
        name: "Golden Trophy",
        description: "One of a kind.",
        price: 50_000,
        stock: Some(1),
    },
];

/// Catalog entry named `name`, compared case-insensitively.
pub fn find_item(name: &str) -> Option<&'static ShopItem> {
    let name = name.trim();
    SHOP.iter().find(|item| item.name.eq_ignore_ascii_case(name))
}
