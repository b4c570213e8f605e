#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The 20 cities the generator draws from.
///
/// Order is load-bearing: it fixes the stable city→index mapping used by
/// fixed-size per-city tallies in the engine.
pub const CITIES: [&str; 20] = [
    "Bogotá",
    "Medellín",
    "Cali",
    "Barranquilla",
    "Cartagena",
    "Bucaramanga",
    "Pereira",
    "Santa Marta",
    "Cúcuta",
    "Ibagué",
    "Manizales",
    "Pasto",
    "Neiva",
    "Villavicencio",
    "Armenia",
    "Sincelejo",
    "Valledupar",
    "Montería",
    "Popayán",
    "Tunja",
];

/// Floor of the generated birth-date range. No generated date string
/// compares below this one under the string ordering.
pub const MIN_BIRTH_DATE: &str = "1/1/1960";

/// Position of a city in [`CITIES`], or `None` for a city outside the table.
#[must_use]
pub fn city_index(name: &str) -> Option<usize> {
    CITIES.iter().position(|city| *city == name)
}

/// Tax-filing calendar assignment: one of three filing groups, or `N` for
/// records that do not file at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingGroup {
    A,
    B,
    C,
    N,
}

impl FilingGroup {
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::N => 'N',
        }
    }

    /// Parse a group tag, accepting either case.
    #[must_use]
    pub fn from_char(tag: char) -> Option<Self> {
        match tag.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'N' => Some(Self::N),
            _ => None,
        }
    }
}

/// Derive the filing group from the id bucket (`numeric id mod 100`).
///
/// Non-filers always land in `N`. The final arm cannot be reached for
/// mod-100 input but is defined rather than left to fall through.
#[must_use]
pub fn filing_group_for(bucket: u8, taxpayer: bool) -> FilingGroup {
    if !taxpayer {
        return FilingGroup::N;
    }
    match bucket {
        0..=39 => FilingGroup::A,
        40..=79 => FilingGroup::B,
        80..=99 => FilingGroup::C,
        _ => FilingGroup::N,
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("id {id:?} is not a string of decimal digits")]
    NonNumericId { id: String },
    #[error("birth date {date:?} is not a D/M/YYYY date within the generated range")]
    InvalidBirthDate { date: String },
    #[error("debt {debt} exceeds 70% of net worth {net_worth}")]
    DebtOverCap { debt: f64, net_worth: f64 },
    #[error("filing group {actual:?} does not match {expected:?} for id bucket {bucket}")]
    FilingGroupMismatch {
        expected: FilingGroup,
        actual: FilingGroup,
        bucket: u8,
    },
}

/// Raw field set for a record, before invariants have been checked.
///
/// The generator fills one of these per person and calls [`PersonaDraft::build`];
/// nothing else constructs a [`Persona`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaDraft {
    pub id: String,
    pub given_name: String,
    pub surname: String,
    pub birth_city: String,
    pub birth_date: String,
    pub annual_income: f64,
    pub net_worth: f64,
    pub debt: f64,
    pub taxpayer: bool,
    pub filing_group: FilingGroup,
}

impl PersonaDraft {
    /// Validate the draft and freeze it into an immutable [`Persona`].
    ///
    /// Checks: the id is all decimal digits, the birth date has the
    /// unpadded `D/M/YYYY` shape within the generated ranges, debt stays
    /// under the 70%-of-net-worth cap, and the filing group matches the id
    /// bucket and taxpayer flag. City membership is the engine's concern,
    /// not the record's.
    pub fn build(self) -> Result<Persona, RecordError> {
        if self.id.is_empty() || !self.id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RecordError::NonNumericId { id: self.id });
        }
        let numeric: u64 = self
            .id
            .parse()
            .map_err(|_| RecordError::NonNumericId { id: self.id.clone() })?;

        validate_birth_date(&self.birth_date)?;

        if self.debt > self.net_worth * 0.7 {
            return Err(RecordError::DebtOverCap {
                debt: self.debt,
                net_worth: self.net_worth,
            });
        }

        let bucket = (numeric % 100) as u8;
        let expected = filing_group_for(bucket, self.taxpayer);
        if expected != self.filing_group {
            return Err(RecordError::FilingGroupMismatch {
                expected,
                actual: self.filing_group,
                bucket,
            });
        }

        Ok(Persona {
            id: self.id,
            given_name: self.given_name,
            surname: self.surname,
            birth_city: self.birth_city,
            birth_date: self.birth_date,
            annual_income: self.annual_income,
            net_worth: self.net_worth,
            debt: self.debt,
            taxpayer: self.taxpayer,
            filing_group: self.filing_group,
        })
    }
}

/// One synthetic person. Immutable after construction; every query over a
/// collection of these is read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persona {
    id: String,
    given_name: String,
    surname: String,
    birth_city: String,
    birth_date: String,
    annual_income: f64,
    net_worth: f64,
    debt: f64,
    taxpayer: bool,
    filing_group: FilingGroup,
}

impl Persona {
    /// Decimal-digit id string. Sorting and searching compare this
    /// lexicographically, never numerically.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    /// Two surname-pool entries joined by a space.
    #[must_use]
    pub fn surname(&self) -> &str {
        &self.surname
    }

    #[must_use]
    pub fn birth_city(&self) -> &str {
        &self.birth_city
    }

    /// Unpadded `D/M/YYYY` string. Date comparisons in the engine operate
    /// on this raw string, so "10/1/1970" orders before "9/1/1960".
    #[must_use]
    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    #[must_use]
    pub fn annual_income(&self) -> f64 {
        self.annual_income
    }

    #[must_use]
    pub fn net_worth(&self) -> f64 {
        self.net_worth
    }

    #[must_use]
    pub fn debt(&self) -> f64 {
        self.debt
    }

    #[must_use]
    pub fn taxpayer(&self) -> bool {
        self.taxpayer
    }

    #[must_use]
    pub fn filing_group(&self) -> FilingGroup {
        self.filing_group
    }
}

/// Accept only the exact shape the generator emits: three unpadded decimal
/// parts, day 1-28, month 1-12, year 1960-2009.
fn validate_birth_date(date: &str) -> Result<(), RecordError> {
    let invalid = || RecordError::InvalidBirthDate {
        date: date.to_owned(),
    };

    let mut parts = date.split('/');
    parse_date_part(parts.next(), 1, 28).ok_or_else(invalid)?;
    parse_date_part(parts.next(), 1, 12).ok_or_else(invalid)?;
    parse_date_part(parts.next(), 1960, 2009).ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(())
}

fn parse_date_part(part: Option<&str>, min: u32, max: u32) -> Option<u32> {
    let part = part?;
    let value: u32 = part.parse().ok()?;
    // Reject padded forms like "01": they would break the string ordering.
    if value.to_string() != part || value < min || value > max {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::{
        CITIES, FilingGroup, MIN_BIRTH_DATE, PersonaDraft, RecordError, city_index,
        filing_group_for,
    };

    fn draft() -> PersonaDraft {
        PersonaDraft {
            id: "1000000007".to_owned(),
            given_name: "Carmen".to_owned(),
            surname: "Rojas Vargas".to_owned(),
            birth_city: "Bogotá".to_owned(),
            birth_date: "14/3/1987".to_owned(),
            annual_income: 82_000_000.0,
            net_worth: 400_000_000.0,
            debt: 120_000_000.0,
            taxpayer: true,
            filing_group: FilingGroup::A,
        }
    }

    #[test]
    fn city_table_has_stable_indexes() {
        assert_eq!(CITIES.len(), 20);
        assert_eq!(city_index("Bogotá"), Some(0));
        assert_eq!(city_index("Santa Marta"), Some(7));
        assert_eq!(city_index("Tunja"), Some(19));
        assert_eq!(city_index("Quibdó"), None);
    }

    #[test]
    fn filing_group_bucket_table() {
        assert_eq!(filing_group_for(0, true), FilingGroup::A);
        assert_eq!(filing_group_for(39, true), FilingGroup::A);
        assert_eq!(filing_group_for(40, true), FilingGroup::B);
        assert_eq!(filing_group_for(79, true), FilingGroup::B);
        assert_eq!(filing_group_for(80, true), FilingGroup::C);
        assert_eq!(filing_group_for(99, true), FilingGroup::C);
    }

    #[test]
    fn non_taxpayers_always_land_in_n() {
        for bucket in [0, 39, 40, 79, 80, 99] {
            assert_eq!(filing_group_for(bucket, false), FilingGroup::N);
        }
    }

    #[test]
    fn out_of_domain_bucket_is_defined() {
        // Unreachable for mod-100 input, but must not be undefined.
        assert_eq!(filing_group_for(200, true), FilingGroup::N);
    }

    #[test]
    fn group_tag_parsing_normalizes_case() {
        assert_eq!(FilingGroup::from_char('a'), Some(FilingGroup::A));
        assert_eq!(FilingGroup::from_char('B'), Some(FilingGroup::B));
        assert_eq!(FilingGroup::from_char('n'), Some(FilingGroup::N));
        assert_eq!(FilingGroup::from_char('x'), None);
        assert_eq!(FilingGroup::C.as_char(), 'C');
    }

    #[test]
    fn build_accepts_a_valid_draft() {
        let persona = draft().build().expect("valid draft");
        assert_eq!(persona.id(), "1000000007");
        assert_eq!(persona.birth_city(), "Bogotá");
        assert_eq!(persona.filing_group(), FilingGroup::A);
        assert!(persona.taxpayer());
    }

    #[test]
    fn build_rejects_non_numeric_id() {
        let mut bad = draft();
        bad.id = "10-7".to_owned();
        let err = bad.build().expect_err("must fail");
        assert_eq!(
            err.to_string(),
            "id \"10-7\" is not a string of decimal digits"
        );
    }

    #[test]
    fn build_rejects_signed_id() {
        // u64::parse would accept "+1000000007"; the digit check must not.
        let mut bad = draft();
        bad.id = "+1000000007".to_owned();
        assert!(matches!(
            bad.build(),
            Err(RecordError::NonNumericId { .. })
        ));
    }

    #[test]
    fn build_rejects_padded_or_out_of_range_dates() {
        for date in ["01/3/1987", "14/3/87", "29/3/1987", "14/13/1987", "14/3/2010", "14/3"] {
            let mut bad = draft();
            bad.birth_date = date.to_owned();
            assert!(
                matches!(bad.build(), Err(RecordError::InvalidBirthDate { .. })),
                "date {date:?} should be rejected"
            );
        }
    }

    #[test]
    fn build_accepts_the_date_floor() {
        let mut ok = draft();
        ok.birth_date = MIN_BIRTH_DATE.to_owned();
        assert!(ok.build().is_ok());
    }

    #[test]
    fn build_rejects_debt_over_the_cap() {
        let mut bad = draft();
        bad.net_worth = 100.0;
        bad.debt = 71.0;
        assert!(matches!(bad.build(), Err(RecordError::DebtOverCap { .. })));

        let mut ok = draft();
        ok.net_worth = 100.0;
        ok.debt = 70.0;
        assert!(ok.build().is_ok());
    }

    #[test]
    fn build_rejects_group_inconsistent_with_bucket() {
        // Bucket 7 with taxpayer=true must be group A.
        let mut bad = draft();
        bad.filing_group = FilingGroup::B;
        assert!(matches!(
            bad.build(),
            Err(RecordError::FilingGroupMismatch { .. })
        ));
    }

    #[test]
    fn build_rejects_n_for_taxpayers_and_abc_for_non_taxpayers() {
        let mut bad = draft();
        bad.filing_group = FilingGroup::N;
        assert!(matches!(
            bad.build(),
            Err(RecordError::FilingGroupMismatch { .. })
        ));

        let mut bad = draft();
        bad.taxpayer = false;
        bad.filing_group = FilingGroup::A;
        assert!(matches!(
            bad.build(),
            Err(RecordError::FilingGroupMismatch { .. })
        ));
    }
}
