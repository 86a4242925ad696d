// Card catalog and deck factory.
//
// The ship and salvo populations are fixed tables; building a deck expands a
// table into cards and returns a shuffled copy. Decks are drawn from the end.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::enums::ShipType;

/// Caliber in inches. Firing requires an exact match between salvo and ship.
pub type GunSize = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipCard {
    pub gun_size: GunSize,
    pub hit_points: u32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub ship_type: ShipType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalvoCard {
    pub gun_size: GunSize,
    pub damage: u32,
}

impl ShipCard {
    pub fn new(name: &str, gun_size: GunSize, hit_points: u32, ship_type: ShipType) -> Self {
        ShipCard {
            gun_size,
            hit_points,
            name: name.to_string(),
            ship_type,
        }
    }

    /// Identity used when a client names a target: caliber plus current hit points.
    pub fn matches(&self, other: &ShipCard) -> bool {
        self.gun_size == other.gun_size && self.hit_points == other.hit_points
    }
}

impl SalvoCard {
    pub fn new(gun_size: GunSize, damage: u32) -> Self {
        SalvoCard { gun_size, damage }
    }

    pub fn matches(&self, other: &SalvoCard) -> bool {
        self.gun_size == other.gun_size && self.damage == other.damage
    }
}

struct ShipClass {
    name: &'static str,
    gun_size: GunSize,
    hit_points: u32,
    count: usize,
    ship_type: ShipType,
}

struct SalvoBand {
    gun_size: GunSize,
    count: usize,
    min_damage: u32,
    max_damage: u32,
}

#[rustfmt::skip]
const SHIP_CLASSES: [ShipClass; 7] = [
    ShipClass { name: "Aircraft Carrier", gun_size: 14.0, hit_points: 8, count: 2, ship_type: ShipType::Carrier },
    ShipClass { name: "Light Cruiser", gun_size: 11.0, hit_points: 3, count: 10, ship_type: ShipType::Normal },
    ShipClass { name: "Heavy Cruiser", gun_size: 12.6, hit_points: 4, count: 10, ship_type: ShipType::Normal },
    ShipClass { name: "Battlecruiser", gun_size: 14.0, hit_points: 5, count: 12, ship_type: ShipType::Normal },
    ShipClass { name: "Battleship", gun_size: 15.0, hit_points: 6, count: 8, ship_type: ShipType::Normal },
    ShipClass { name: "Super Battleship", gun_size: 16.0, hit_points: 7, count: 8, ship_type: ShipType::Normal },
    ShipClass { name: "Super Dreadnought", gun_size: 18.0, hit_points: 9, count: 6, ship_type: ShipType::Normal },
];

#[rustfmt::skip]
const SALVO_BANDS: [SalvoBand; 6] = [
    SalvoBand { gun_size: 11.0, count: 24, min_damage: 1, max_damage: 2 },
    SalvoBand { gun_size: 12.6, count: 20, min_damage: 1, max_damage: 2 },
    SalvoBand { gun_size: 14.0, count: 24, min_damage: 1, max_damage: 3 },
    SalvoBand { gun_size: 15.0, count: 16, min_damage: 2, max_damage: 4 },
    SalvoBand { gun_size: 16.0, count: 16, min_damage: 2, max_damage: 4 },
    SalvoBand { gun_size: 18.0, count: 8, min_damage: 3, max_damage: 4 },
];

pub const SHIP_DECK_SIZE: usize = 56;
pub const SALVO_DECK_SIZE: usize = 108;

/// Returns a shuffled copy; the input is left untouched.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(cards: &[T], rng: &mut R) -> Vec<T> {
    let mut deck = cards.to_vec();
    deck.shuffle(rng);
    deck
}

pub fn build_ship_deck() -> Vec<ShipCard> {
    build_ship_deck_with(&mut rand::thread_rng())
}

pub fn build_ship_deck_with<R: Rng + ?Sized>(rng: &mut R) -> Vec<ShipCard> {
    let ships: Vec<ShipCard> = SHIP_CLASSES
        .iter()
        .flat_map(|class| {
            (0..class.count).map(move |_| {
                ShipCard::new(class.name, class.gun_size, class.hit_points, class.ship_type)
            })
        })
        .collect();
    shuffled(&ships, rng)
}

pub fn build_salvo_deck() -> Vec<SalvoCard> {
    build_salvo_deck_with(&mut rand::thread_rng())
}

pub fn build_salvo_deck_with<R: Rng + ?Sized>(rng: &mut R) -> Vec<SalvoCard> {
    let mut salvos = Vec::with_capacity(SALVO_DECK_SIZE);
    for band in &SALVO_BANDS {
        for _ in 0..band.count {
            let damage = rng.gen_range(band.min_damage..=band.max_damage);
            salvos.push(SalvoCard::new(band.gun_size, damage));
        }
    }
    shuffled(&salvos, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn count_ships(deck: &[ShipCard], name: &str) -> usize {
        deck.iter().filter(|s| s.name == name).count()
    }

    #[test]
    fn test_ship_deck_population() {
        let deck = build_ship_deck();
        assert_eq!(deck.len(), SHIP_DECK_SIZE);
        assert_eq!(count_ships(&deck, "Aircraft Carrier"), 2);
        assert_eq!(count_ships(&deck, "Light Cruiser"), 10);
        assert_eq!(count_ships(&deck, "Heavy Cruiser"), 10);
        assert_eq!(count_ships(&deck, "Battlecruiser"), 12);
        assert_eq!(count_ships(&deck, "Battleship"), 8);
        assert_eq!(count_ships(&deck, "Super Battleship"), 8);
        assert_eq!(count_ships(&deck, "Super Dreadnought"), 6);

        let carriers: Vec<_> = deck
            .iter()
            .filter(|s| s.ship_type == ShipType::Carrier)
            .collect();
        assert_eq!(carriers.len(), 2);
        assert!(carriers.iter().all(|c| c.gun_size == 14.0 && c.hit_points == 8));
    }

    #[test]
    fn test_salvo_deck_bands_and_damage_ranges() {
        let deck = build_salvo_deck();
        assert_eq!(deck.len(), SALVO_DECK_SIZE);

        for band in &SALVO_BANDS {
            let cards: Vec<_> = deck.iter().filter(|c| c.gun_size == band.gun_size).collect();
            assert_eq!(cards.len(), band.count, "band {}", band.gun_size);
            assert!(cards
                .iter()
                .all(|c| c.damage >= band.min_damage && c.damage <= band.max_damage));
        }
    }

    #[test]
    fn test_shuffle_leaves_input_untouched() {
        let original: Vec<u32> = (0..20).collect();
        let mut rng = XorShiftRng::seed_from_u64(7);
        let result = shuffled(&original, &mut rng);

        assert_eq!(original, (0..20).collect::<Vec<_>>());
        let mut sorted = result.clone();
        sorted.sort();
        assert_eq!(sorted, original);
    }

    #[test]
    fn test_seeded_decks_are_reproducible() {
        let a = build_ship_deck_with(&mut XorShiftRng::seed_from_u64(42));
        let b = build_ship_deck_with(&mut XorShiftRng::seed_from_u64(42));
        assert_eq!(a, b);

        let a = build_salvo_deck_with(&mut XorShiftRng::seed_from_u64(42));
        let b = build_salvo_deck_with(&mut XorShiftRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
