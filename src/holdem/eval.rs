//! Hand evaluation: ten classes, category tiebreakers, best five of seven.

use serde::{Deserialize, Serialize};

use super::cards::{Card, Rank};

/// The ten hand classes in ascending strength. The wheel straight
/// (`A-2-3-4-5`) ranks as five-high; a royal flush is its own class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandClass {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandClass {
    pub fn rank_value(self) -> u8 {
        self as u8 + 1
    }
}

/// A classified hand. Ordering by `(class, tiebreakers lexicographically)`
/// is a total order over all five-card hands; tiebreaker vectors within a
/// class always have the same length.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EvaluatedHand {
    pub class: HandClass,
    pub tiebreakers: Vec<Rank>,
}

/// Straight high card for five distinct descending ranks, if any.
fn straight_high(desc_unique: &[Rank]) -> Option<Rank> {
    if desc_unique.len() != 5 {
        return None;
    }
    if desc_unique[0] - desc_unique[4] == 4 {
        return Some(desc_unique[0]);
    }
    let wheel: [Rank; 5] = [14, 5, 4, 3, 2];
    if desc_unique == wheel.as_slice() {
        return Some(5);
    }
    None
}

pub fn evaluate_five(cards: &[Card; 5]) -> EvaluatedHand {
    let mut ranks: Vec<Rank> = cards.iter().map(|c| c.rank).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let mut unique = ranks.clone();
    unique.dedup();
    let straight = straight_high(&unique);

    // Rank groups, largest count first, then highest rank.
    let mut counts = [0u8; 15];
    for &r in &ranks {
        counts[r as usize] += 1;
    }
    let mut groups: Vec<(u8, Rank)> = (2..=14)
        .rev()
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    if flush {
        if let Some(high) = straight {
            return if high == 14 {
                EvaluatedHand { class: HandClass::RoyalFlush, tiebreakers: vec![14] }
            } else {
                EvaluatedHand { class: HandClass::StraightFlush, tiebreakers: vec![high] }
            };
        }
    }
    if groups[0].0 == 4 {
        return EvaluatedHand {
            class: HandClass::FourOfAKind,
            tiebreakers: vec![groups[0].1, groups[1].1],
        };
    }
    if groups[0].0 == 3 && groups[1].0 == 2 {
        return EvaluatedHand {
            class: HandClass::FullHouse,
            tiebreakers: vec![groups[0].1, groups[1].1],
        };
    }
    if flush {
        return EvaluatedHand { class: HandClass::Flush, tiebreakers: ranks };
    }
    if let Some(high) = straight {
        return EvaluatedHand { class: HandClass::Straight, tiebreakers: vec![high] };
    }
    if groups[0].0 == 3 {
        return EvaluatedHand {
            class: HandClass::ThreeOfAKind,
            tiebreakers: vec![groups[0].1, groups[1].1, groups[2].1],
        };
    }
    if groups[0].0 == 2 && groups[1].0 == 2 {
        return EvaluatedHand {
            class: HandClass::TwoPair,
            tiebreakers: vec![groups[0].1, groups[1].1, groups[2].1],
        };
    }
    if groups[0].0 == 2 {
        return EvaluatedHand {
            class: HandClass::OnePair,
            tiebreakers: vec![groups[0].1, groups[1].1, groups[2].1, groups[3].1],
        };
    }
    EvaluatedHand { class: HandClass::HighCard, tiebreakers: ranks }
}

/// Enumerate all C(7,5) = 21 five-card subsets and keep the maximum.
pub fn best_five_of_seven(cards: &[Card; 7]) -> EvaluatedHand {
    let mut best: Option<EvaluatedHand> = None;
    for a in 0..3 {
        for b in (a + 1)..4 {
            for c in (b + 1)..5 {
                for d in (c + 1)..6 {
                    for e in (d + 1)..7 {
                        let five = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let hand = evaluate_five(&five);
                        if best.as_ref().map_or(true, |current| hand > *current) {
                            best = Some(hand);
                        }
                    }
                }
            }
        }
    }
    // 21 candidates were evaluated, so `best` is always set.
    best.unwrap_or(EvaluatedHand { class: HandClass::HighCard, tiebreakers: vec![] })
}
