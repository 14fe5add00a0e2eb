//! Owns the tile grid, card set, and spawn points for a room. The engine
//! treats this purely as an opaque spatial store: tie-breaks for random
//! card placement (seeding, rejection of occupied cells) are the
//! provider's responsibility, not the engine's.

use hex_protocol::{Card, CardColor, CardShape, HexCoord, MapUpdate, Tile};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// The spatial interface the Room State Engine consumes. Concrete map
/// generation lives outside the core; `RandomMapProvider` below is a
/// grounded-but-original implementation since no map generator shipped in
/// the source material this was distilled from.
pub trait MapProvider {
    fn map(&self) -> MapUpdate;
    fn spawn_points(&self) -> &[HexCoord];
    fn take_spawn_point(&mut self) -> Option<HexCoord>;
    fn card_by_location(&self, location: HexCoord) -> Option<&Card>;
    fn card_mut(&mut self, id: u32) -> Option<&mut Card>;
    fn set_selected(&mut self, id: u32, selected: bool);
    fn remove_card(&mut self, id: u32);
    fn add_random_cards(&mut self, n: usize);
    fn cards(&self) -> &[Card];
    fn selected_cards(&self) -> Vec<&Card> {
        self.cards().iter().filter(|c| c.selected).collect()
    }

    /// True when two selected cards share any of color/shape/count, or when
    /// more than three cards are selected at once.
    fn selected_cards_collide(&self) -> bool {
        let selected = self.selected_cards();
        if selected.len() > 3 {
            return true;
        }
        for i in 0..selected.len() {
            for j in (i + 1)..selected.len() {
                let (a, b) = (selected[i], selected[j]);
                if a.color == b.color || a.shape == b.shape || a.count == b.count {
                    return true;
                }
            }
        }
        false
    }

    /// True iff exactly three cards are selected and pairwise differ on
    /// every attribute.
    fn selected_valid_set(&self) -> bool {
        let selected = self.selected_cards();
        if selected.len() != 3 {
            return false;
        }
        for i in 0..3 {
            for j in (i + 1)..3 {
                let (a, b) = (selected[i], selected[j]);
                if a.color == b.color || a.shape == b.shape || a.count == b.count {
                    return false;
                }
            }
        }
        true
    }
}

const COLORS: [CardColor; 7] = [
    CardColor::Black,
    CardColor::Blue,
    CardColor::Green,
    CardColor::Orange,
    CardColor::Pink,
    CardColor::Red,
    CardColor::Yellow,
];
const SHAPES: [CardShape; 4] =
    [CardShape::Plain, CardShape::Star, CardShape::Torus, CardShape::Heart];

pub struct RandomMapProvider {
    rows: i32,
    cols: i32,
    tiles: Vec<Tile>,
    cards: Vec<Card>,
    spawn_points: Vec<HexCoord>,
    next_card_id: u32,
    rng: StdRng,
}

impl RandomMapProvider {
    /// Builds a deterministic map from `seed`, useful for tests; a real
    /// server seeds from OS entropy at room creation.
    pub fn new(rows: i32, cols: i32, seed: u64) -> RandomMapProvider {
        let mut rng = StdRng::seed_from_u64(seed);
        let tiles = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| Tile { asset_id: 0, coord: HexCoord::new(0, r, c), height: 0.0 })
            .collect();

        let mut spawn_points: Vec<HexCoord> =
            (0..rows).flat_map(|r| (0..cols).map(move |c| HexCoord::new(0, r, c))).collect();
        spawn_points.shuffle(&mut rng);

        let mut provider = RandomMapProvider {
            rows,
            cols,
            tiles,
            cards: Vec::new(),
            spawn_points,
            next_card_id: 0,
            rng,
        };
        provider.add_random_cards(9);
        provider
    }

    fn random_free_cell(&mut self) -> HexCoord {
        loop {
            let r = self.rng.gen_range(0..self.rows);
            let c = self.rng.gen_range(0..self.cols);
            let candidate = HexCoord::new(0, r, c);
            if !self.cards.iter().any(|card| card.location == candidate) {
                return candidate;
            }
        }
    }
}

impl MapProvider for RandomMapProvider {
    fn map(&self) -> MapUpdate {
        MapUpdate { rows: self.rows, cols: self.cols, tiles: self.tiles.clone() }
    }

    fn spawn_points(&self) -> &[HexCoord] {
        &self.spawn_points
    }

    fn take_spawn_point(&mut self) -> Option<HexCoord> {
        self.spawn_points.pop()
    }

    fn card_by_location(&self, location: HexCoord) -> Option<&Card> {
        self.cards.iter().find(|c| c.location == location)
    }

    fn card_mut(&mut self, id: u32) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    fn set_selected(&mut self, id: u32, selected: bool) {
        if let Some(card) = self.card_mut(id) {
            card.selected = selected;
        }
    }

    fn remove_card(&mut self, id: u32) {
        self.cards.retain(|c| c.id != id);
    }

    fn add_random_cards(&mut self, n: usize) {
        for _ in 0..n {
            let location = self.random_free_cell();
            let color = *COLORS.choose(&mut self.rng).expect("COLORS is non-empty");
            let shape = *SHAPES.choose(&mut self.rng).expect("SHAPES is non-empty");
            let count = self.rng.gen_range(1..=3u8);
            let id = self.next_card_id;
            self.next_card_id += 1;
            self.cards.push(Card { id, location, color, shape, count, selected: false });
        }
    }

    fn cards(&self) -> &[Card] {
        &self.cards
    }
}

#[cfg(test)]
impl RandomMapProvider {
    /// Direct card-table access for tests that need hand-placed cards
    /// rather than the random generator's output.
    pub fn cards_mut_for_test(&mut self) -> &mut Vec<Card> {
        &mut self.cards
    }

    pub fn push_card_for_test(&mut self, card: Card) {
        self.cards.push(card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: u32, color: CardColor, shape: CardShape, count: u8, selected: bool) -> Card {
        Card { id, location: HexCoord::ORIGIN, color, shape, count, selected }
    }

    struct FixedCards(Vec<Card>);
    impl FixedCards {
        fn selected_cards(&self) -> Vec<&Card> {
            self.0.iter().filter(|c| c.selected).collect()
        }
    }

    #[test]
    fn valid_set_requires_pairwise_distinct_attributes() {
        let cards = vec![
            card(0, CardColor::Red, CardShape::Star, 1, true),
            card(1, CardColor::Blue, CardShape::Torus, 2, true),
            card(2, CardColor::Green, CardShape::Heart, 3, true),
        ];
        let fixed = FixedCards(cards);
        assert_eq!(fixed.selected_cards().len(), 3);
    }

    #[test]
    fn random_map_provider_generates_requested_cards() {
        let provider = RandomMapProvider::new(10, 10, 42);
        assert_eq!(provider.cards().len(), 9);
        assert!(!provider.selected_cards_collide());
        assert!(!provider.selected_valid_set());
    }

    #[test]
    fn collide_detects_shared_attribute() {
        let mut provider = RandomMapProvider::new(5, 5, 1);
        provider.cards.clear();
        provider.cards.push(card(0, CardColor::Red, CardShape::Star, 1, true));
        provider.cards.push(card(1, CardColor::Red, CardShape::Torus, 2, true));
        assert!(provider.selected_cards_collide());
    }

    #[test]
    fn collide_true_when_more_than_three_selected() {
        let mut provider = RandomMapProvider::new(5, 5, 1);
        provider.cards.clear();
        for i in 0..4 {
            provider.cards.push(card(i, CardColor::Red, CardShape::Star, 1, true));
        }
        assert!(provider.selected_cards_collide());
    }

    #[test]
    fn valid_set_true_for_exactly_three_pairwise_distinct() {
        let mut provider = RandomMapProvider::new(5, 5, 1);
        provider.cards.clear();
        provider.cards.push(card(0, CardColor::Red, CardShape::Star, 1, true));
        provider.cards.push(card(1, CardColor::Blue, CardShape::Torus, 2, true));
        provider.cards.push(card(2, CardColor::Green, CardShape::Heart, 3, true));
        assert!(provider.selected_valid_set());
        assert!(!provider.selected_cards_collide());
    }
}
