#![forbid(unsafe_code)]

//! Presentation for the interactive driver: menu text and record
//! formatting. The engine never calls into this crate; its results are
//! handed here for display only.

use censo_types::Persona;

/// Fixed two-decimal money rendering; never scientific notation.
#[must_use]
pub fn format_money(value: f64) -> String {
    format!("${value:.2}")
}

/// Multi-line card with every field of one record.
#[must_use]
pub fn format_detailed(persona: &Persona) -> String {
    let filing = if persona.taxpayer() {
        format!("yes (group {})", persona.filing_group().as_char())
    } else {
        "no".to_owned()
    };
    format!(
        "=== {id} ===\n\
         Name:          {name} {surname}\n\
         Birth city:    {city}\n\
         Birth date:    {date}\n\
         Annual income: {income}\n\
         Net worth:     {net_worth}\n\
         Debt:          {debt}\n\
         Files taxes:   {filing}",
        id = persona.id(),
        name = persona.given_name(),
        surname = persona.surname(),
        city = persona.birth_city(),
        date = persona.birth_date(),
        income = format_money(persona.annual_income()),
        net_worth = format_money(persona.net_worth()),
        debt = format_money(persona.debt()),
    )
}

/// One-line digest used by listings.
#[must_use]
pub fn format_summary_line(persona: &Persona) -> String {
    format!(
        "[{id}] {name} {surname} | {city} | {net_worth} | group {group}",
        id = persona.id(),
        name = persona.given_name(),
        surname = persona.surname(),
        city = persona.birth_city(),
        net_worth = format_money(persona.net_worth()),
        group = persona.filing_group().as_char(),
    )
}

#[must_use]
pub fn menu() -> &'static str {
    "
=== MAIN MENU ===
 0. Generate a new dataset
 1. List all records
 2. Show record detail by index
 3. Find record by id
 4. Show performance summary
 5. Oldest person
 6. Largest net worth
 7. Filing groups
 8. Dominant filing group per city
 9. Top cities by average net worth
10. Export performance log (CSV)
11. Exit"
}

#[cfg(test)]
mod tests {
    use censo_types::{FilingGroup, Persona, PersonaDraft};

    use super::{format_detailed, format_money, format_summary_line, menu};

    fn persona() -> Persona {
        PersonaDraft {
            id: "1000000010".to_owned(),
            given_name: "Diana".to_owned(),
            surname: "Suárez Moreno".to_owned(),
            birth_city: "Pereira".to_owned(),
            birth_date: "7/11/1975".to_owned(),
            annual_income: 95_000_000.0,
            net_worth: 1_250_000_000.5,
            debt: 100_000_000.0,
            taxpayer: true,
            filing_group: FilingGroup::A,
        }
        .build()
        .expect("valid test record")
    }

    #[test]
    fn money_is_fixed_two_decimals() {
        assert_eq!(format_money(1_250_000_000.5), "$1250000000.50");
        assert_eq!(format_money(0.0), "$0.00");
    }

    #[test]
    fn detailed_card_lists_every_field() {
        let card = format_detailed(&persona());
        assert!(card.starts_with("=== 1000000010 ==="));
        assert!(card.contains("Diana Suárez Moreno"));
        assert!(card.contains("Birth city:    Pereira"));
        assert!(card.contains("Birth date:    7/11/1975"));
        assert!(card.contains("$95000000.00"));
        assert!(card.contains("Files taxes:   yes (group A)"));
    }

    #[test]
    fn summary_line_golden() {
        assert_eq!(
            format_summary_line(&persona()),
            "[1000000010] Diana Suárez Moreno | Pereira | $1250000000.50 | group A"
        );
    }

    #[test]
    fn non_filers_show_no_group_suffix() {
        let draft = PersonaDraft {
            id: "1000000011".to_owned(),
            given_name: "Pedro".to_owned(),
            surname: "Castro Ruiz".to_owned(),
            birth_city: "Neiva".to_owned(),
            birth_date: "3/4/1990".to_owned(),
            annual_income: 20_000_000.0,
            net_worth: 10_000_000.0,
            debt: 0.0,
            taxpayer: false,
            filing_group: FilingGroup::N,
        };
        let card = format_detailed(&draft.build().expect("valid test record"));
        assert!(card.contains("Files taxes:   no"));
    }

    #[test]
    fn menu_names_every_operation() {
        let text = menu();
        for needle in [
            "0. Generate",
            "3. Find record by id",
            "9. Top cities",
            "10. Export performance log",
            "11. Exit",
        ] {
            assert!(text.contains(needle), "menu misses {needle:?}");
        }
    }
}
