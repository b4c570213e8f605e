#![forbid(unsafe_code)]

use censo_types::{CITIES, Persona, PersonaDraft, RecordError, filing_group_for};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Female given-name pool.
pub const FEMALE_NAMES: [&str; 20] = [
    "María",
    "Luisa",
    "Carmen",
    "Ana",
    "Sofía",
    "Isabel",
    "Laura",
    "Andrea",
    "Paula",
    "Valentina",
    "Camila",
    "Daniela",
    "Carolina",
    "Fernanda",
    "Gabriela",
    "Patricia",
    "Claudia",
    "Diana",
    "Lucía",
    "Ximena",
];

/// Male given-name pool.
pub const MALE_NAMES: [&str; 23] = [
    "Juan",
    "Carlos",
    "José",
    "James",
    "Andrés",
    "Miguel",
    "Luis",
    "Pedro",
    "Alejandro",
    "Ricardo",
    "Felipe",
    "David",
    "Jorge",
    "Santiago",
    "Daniel",
    "Fernando",
    "Diego",
    "Rafael",
    "Martín",
    "Óscar",
    "Edison",
    "Nestor",
    "Gertridis",
];

/// Surname pool; each record draws two entries joined by a space.
pub const SURNAMES: [&str; 21] = [
    "Gómez",
    "Rodríguez",
    "Martínez",
    "López",
    "García",
    "Pérez",
    "González",
    "Sánchez",
    "Ramírez",
    "Torres",
    "Díaz",
    "Vargas",
    "Castro",
    "Ruiz",
    "Álvarez",
    "Romero",
    "Suárez",
    "Rojas",
    "Moreno",
    "Muñoz",
    "Valencia",
];

/// Explicit id counter, owned by the generator rather than hidden in
/// process-wide static state. Ids are unique and strictly increasing for
/// the sequence's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// First id ever issued; ten digits wide, so the lexicographic and
    /// numeric orderings coincide for the whole practical range.
    pub const FIRST_ID: u64 = 1_000_000_000;

    #[must_use]
    pub fn new() -> Self {
        Self {
            next: Self::FIRST_ID,
        }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Seeded record generator. Same seed, same records.
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
    ids: IdSequence,
}

impl Generator {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ids: IdSequence::new(),
        }
    }

    /// Produce one record satisfying every data-model invariant.
    pub fn generate_one(&mut self) -> Result<Persona, RecordError> {
        let male = self.rng.random_bool(0.5);
        let given_name = if male {
            MALE_NAMES[self.rng.random_range(0..MALE_NAMES.len())]
        } else {
            FEMALE_NAMES[self.rng.random_range(0..FEMALE_NAMES.len())]
        };
        let surname = format!(
            "{} {}",
            SURNAMES[self.rng.random_range(0..SURNAMES.len())],
            SURNAMES[self.rng.random_range(0..SURNAMES.len())]
        );

        let id = self.ids.next_id();
        let birth_city = CITIES[self.rng.random_range(0..CITIES.len())];
        let birth_date = self.birth_date();

        let annual_income = self.rng.random_range(10_000_000.0..500_000_000.0);
        let net_worth = self.rng.random_range(0.0..2_000_000_000.0);
        let debt_cap = net_worth * 0.7;
        let debt = if debt_cap > 0.0 {
            self.rng.random_range(0.0..debt_cap)
        } else {
            0.0
        };
        let taxpayer = annual_income > 50_000_000.0 && self.rng.random_bool(0.7);

        PersonaDraft {
            id: id.to_string(),
            given_name: given_name.to_owned(),
            surname,
            birth_city: birth_city.to_owned(),
            birth_date,
            annual_income,
            net_worth,
            debt,
            taxpayer,
            filing_group: filing_group_for((id % 100) as u8, taxpayer),
        }
        .build()
    }

    /// Produce `n` records. Ids ascend with position, so the output is
    /// already sorted by id; the caller replaces its previous collection
    /// wholesale with the result.
    pub fn generate_many(&mut self, n: usize) -> Result<Vec<Persona>, RecordError> {
        let mut personas = Vec::with_capacity(n);
        for _ in 0..n {
            personas.push(self.generate_one()?);
        }
        debug!(count = n, "generated synthetic cohort");
        Ok(personas)
    }

    /// Day 1-28 sidesteps month-length handling; the unpadded `D/M/YYYY`
    /// rendering is the ordering the engine compares by.
    fn birth_date(&mut self) -> String {
        let day: u32 = self.rng.random_range(1..=28);
        let month: u32 = self.rng.random_range(1..=12);
        let year: u32 = self.rng.random_range(1960..=2009);
        format!("{day}/{month}/{year}")
    }
}
