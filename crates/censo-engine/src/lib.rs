#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use censo_types::{CITIES, FilingGroup, MIN_BIRTH_DATE, Persona, city_index};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("birth city {city:?} is not in the city table")]
    UnknownCity { city: String },
}

/// Numeric field selector for extremum queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    NetWorth,
    Debt,
}

impl NumericField {
    #[must_use]
    pub fn value(self, persona: &Persona) -> f64 {
        match self {
            Self::NetWorth => persona.net_worth(),
            Self::Debt => persona.debt(),
        }
    }
}

/// Binary search by id on the string ordering.
///
/// Precondition: `personas` is sorted by id under that same ordering, as
/// the generator produces it. Use [`find_by_id_scan`] when the ordering is
/// not guaranteed.
#[must_use]
pub fn find_by_id<'a>(personas: &'a [Persona], id: &str) -> Option<&'a Persona> {
    personas
        .binary_search_by(|persona| persona.id().cmp(id))
        .ok()
        .map(|pos| &personas[pos])
}

/// Linear id lookup with no ordering precondition.
#[must_use]
pub fn find_by_id_scan<'a>(personas: &'a [Persona], id: &str) -> Option<&'a Persona> {
    personas.iter().find(|persona| persona.id() == id)
}

/// Record maximizing `field` over the whole collection, or `None` when it
/// is empty. Only a strictly greater value replaces the running best, so
/// the first of tied records wins.
#[must_use]
pub fn global_max(personas: &[Persona], field: NumericField) -> Option<&Persona> {
    let mut best: Option<&Persona> = None;
    for persona in personas {
        let better = match best {
            None => true,
            Some(current) => field.value(persona) > field.value(current),
        };
        if better {
            best = Some(persona);
        }
    }
    best
}

/// One-pass running best per key: a keyed slot map plus a first-seen
/// ordering vector. Strictly-greater updates keep the first of ties.
fn running_best_by<'a, K>(
    personas: &'a [Persona],
    key_of: impl Fn(&'a Persona) -> K,
    field: NumericField,
) -> Vec<(K, &'a Persona)>
where
    K: Eq + Hash + Copy,
{
    let mut ordering = Vec::new();
    let mut slot: HashMap<K, &'a Persona> = HashMap::new();

    for persona in personas {
        match slot.entry(key_of(persona)) {
            Entry::Vacant(entry) => {
                ordering.push(*entry.key());
                entry.insert(persona);
            }
            Entry::Occupied(mut entry) => {
                if field.value(persona) > field.value(entry.get()) {
                    entry.insert(persona);
                }
            }
        }
    }

    ordering
        .into_iter()
        .map(|key| {
            let best = slot
                .remove(&key)
                .expect("ordering references only inserted keys");
            (key, best)
        })
        .collect()
}

/// Per-city winner for `field`, one entry per city present in the data,
/// in first-seen city order.
#[must_use]
pub fn max_by_city<'a>(
    personas: &'a [Persona],
    field: NumericField,
) -> Vec<(&'a str, &'a Persona)> {
    running_best_by(personas, Persona::birth_city, field)
}

/// Per-filing-group winner for `field`, one entry per group present in the
/// data, in first-seen group order.
#[must_use]
pub fn max_by_filing_group(
    personas: &[Persona],
    field: NumericField,
) -> Vec<(FilingGroup, &Persona)> {
    running_best_by(personas, Persona::filing_group, field)
}

/// Record with the smallest birth-date string, or `None` on empty input.
///
/// The scan stops as soon as the running best reaches [`MIN_BIRTH_DATE`]:
/// that literal is the documented floor of the generated range, so no
/// later record can order below it.
#[must_use]
pub fn oldest(personas: &[Persona]) -> Option<&Persona> {
    oldest_scan(personas)
}

fn oldest_scan<'a>(personas: impl IntoIterator<Item = &'a Persona>) -> Option<&'a Persona> {
    let mut best: Option<&Persona> = None;
    for persona in personas {
        let older = match best {
            None => true,
            Some(current) => persona.birth_date() < current.birth_date(),
        };
        if older {
            best = Some(persona);
            if persona.birth_date() == MIN_BIRTH_DATE {
                break;
            }
        }
    }
    best
}

/// Per-city record with the smallest birth-date string, in first-occurrence
/// city order. A pair list with linear lookup: city cardinality is bounded
/// by the fixed table, so a map buys nothing here.
#[must_use]
pub fn oldest_by_city(personas: &[Persona]) -> Vec<(&str, &Persona)> {
    let mut winners: Vec<(&str, &Persona)> = Vec::new();
    for persona in personas {
        match winners
            .iter_mut()
            .find(|(city, _)| *city == persona.birth_city())
        {
            None => winners.push((persona.birth_city(), persona)),
            Some((_, best)) => {
                if persona.birth_date() < best.birth_date() {
                    *best = persona;
                }
            }
        }
    }
    winners
}

/// Every record in `group`, in input order. The count is the vector length.
#[must_use]
pub fn filter_by_filing_group(personas: &[Persona], group: FilingGroup) -> Vec<&Persona> {
    personas
        .iter()
        .filter(|persona| persona.filing_group() == group)
        .collect()
}

/// A/B/C tally for one city plus the winning group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityGroupTally {
    pub city: &'static str,
    /// Counts for groups A, B, C in that order. Group N is excluded.
    pub counts: [u32; 3],
    pub dominant: FilingGroup,
}

/// For each of the 20 cities, the filing group with the most records.
///
/// Group N is excluded from the tally. Ties resolve to the first group
/// index achieving the max (A over B over C), and all 20 cities are
/// reported, an all-zero tally resolving to A. A city outside the fixed
/// table is a data-integrity defect and fails fast.
pub fn dominant_group_per_city(personas: &[Persona]) -> Result<Vec<CityGroupTally>, EngineError> {
    const GROUPS: [FilingGroup; 3] = [FilingGroup::A, FilingGroup::B, FilingGroup::C];

    let mut tallies = [[0u32; 3]; 20];
    for persona in personas {
        let city_pos = city_index(persona.birth_city()).ok_or_else(|| EngineError::UnknownCity {
            city: persona.birth_city().to_owned(),
        })?;
        let group_pos = match persona.filing_group() {
            FilingGroup::A => 0,
            FilingGroup::B => 1,
            FilingGroup::C => 2,
            FilingGroup::N => continue,
        };
        tallies[city_pos][group_pos] += 1;
    }

    Ok(CITIES
        .iter()
        .zip(tallies.iter())
        .map(|(city, counts)| {
            let mut winner = 0;
            for pos in 1..counts.len() {
                if counts[pos] > counts[winner] {
                    winner = pos;
                }
            }
            CityGroupTally {
                city,
                counts: *counts,
                dominant: GROUPS[winner],
            }
        })
        .collect())
}

/// Mean net worth of one city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityAverage {
    pub city: &'static str,
    pub mean_net_worth: f64,
    pub residents: u32,
}

/// Top `k` cities by mean net worth, descending. Cities with no records
/// are excluded; ties keep table order (stable sort). A city outside the
/// fixed table fails fast.
pub fn top_average_net_worth_cities(
    personas: &[Persona],
    k: usize,
) -> Result<Vec<CityAverage>, EngineError> {
    let mut sums = [0.0f64; 20];
    let mut counts = [0u32; 20];
    for persona in personas {
        let pos = city_index(persona.birth_city()).ok_or_else(|| EngineError::UnknownCity {
            city: persona.birth_city().to_owned(),
        })?;
        sums[pos] += persona.net_worth();
        counts[pos] += 1;
    }

    let mut averages: Vec<CityAverage> = Vec::new();
    for pos in 0..CITIES.len() {
        if counts[pos] > 0 {
            averages.push(CityAverage {
                city: CITIES[pos],
                mean_net_worth: sums[pos] / f64::from(counts[pos]),
                residents: counts[pos],
            });
        }
    }

    averages.sort_by(|a, b| {
        b.mean_net_worth
            .partial_cmp(&a.mean_net_worth)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    averages.truncate(k);
    Ok(averages)
}
