// Synthetic roster generator: sample datasets with a controlled injected
// duplicate rate, for testing the cleaning pipeline at scale.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rosterkit_core::{Record, Table};

const FIRST_NAMES: &[&str] = &[
    "Alice", "Amina", "Benjamin", "Carlos", "Chloe", "Daniel", "Elena", "Fatima", "George",
    "Hannah", "Ibrahim", "Jasmine", "Kwame", "Leila", "Mateo", "Nadia", "Oliver", "Priya",
    "Quentin", "Rosa", "Samuel", "Tara", "Umar", "Valeria", "Wei", "Ximena", "Yusuf", "Zara",
];

const LAST_NAMES: &[&str] = &[
    "Adams", "Bergstrom", "Chen", "Diallo", "Evans", "Fernandez", "Gupta", "Haddad", "Ivanov",
    "Johnson", "Kimura", "Lopez", "Mensah", "Novak", "Okafor", "Patel", "Quinn", "Rossi",
    "Silva", "Tanaka", "Umarov", "Vasquez", "Williams", "Xu", "Yilmaz", "Zhang",
];

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base records generated before duplicate injection.
    pub rows: usize,
    /// Fraction of base records duplicated and appended (0.0..=1.0).
    pub duplicate_rate: f64,
    pub seed: u64,
}

/// Generate a roster table: `rows` base records plus
/// `floor(rows * duplicate_rate)` appended duplicates. Some duplicates get
/// minor name variations (case flips, adjacent-character swaps) so fuzzy
/// matching has something to chew on; identity fields stay untouched.
pub fn generate_roster(config: &GeneratorConfig) -> Table {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut table = Table::new(
        [
            "StudentName",
            "DateOfBirth",
            "AcademicYear",
            "Gender",
            "Grade",
            "EnrollmentDate",
            "SchoolID",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect(),
    );

    let years = ["2021", "2022", "2023", "2024"];
    for i in 0..config.rows {
        let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
        let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
        let year = years[rng.gen_range(0..years.len())];
        let dob = format!(
            "{}-{:02}-{:02}",
            rng.gen_range(2005..=2018),
            rng.gen_range(1..=12),
            rng.gen_range(1..=28),
        );
        let enrolled = format!(
            "{year}-{:02}-{:02}",
            rng.gen_range(8..=9),
            rng.gen_range(1..=28),
        );
        table.rows.push(Record::new(
            i,
            vec![
                format!("{first} {last}"),
                dob,
                year.to_string(),
                if rng.gen_bool(0.5) { "M" } else { "F" }.to_string(),
                rng.gen_range(1..=12).to_string(),
                enrolled,
                format!("SCH{:03}", rng.gen_range(1..=20)),
            ],
        ));
    }

    let duplicates = (config.rows as f64 * config.duplicate_rate) as usize;
    for _ in 0..duplicates {
        let src = rng.gen_range(0..config.rows);
        let mut values = table.rows[src].values.clone();
        if rng.gen_bool(0.3) {
            values[0] = vary_name(&values[0], &mut rng);
        }
        let origin = table.len();
        table.rows.push(Record::new(origin, values));
    }

    table
}

/// Minor variation: flip the whole name's case or swap two adjacent
/// characters in the first token.
fn vary_name(name: &str, rng: &mut StdRng) -> String {
    if rng.gen_bool(0.5) {
        if rng.gen_bool(0.5) {
            name.to_uppercase()
        } else {
            name.to_lowercase()
        }
    } else {
        let mut chars: Vec<char> = name.chars().collect();
        let first_len = name.split_whitespace().next().map(str::len).unwrap_or(0);
        if first_len > 3 {
            let i = rng.gen_range(1..first_len - 1);
            chars.swap(i, i + 1);
        }
        chars.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_counts_match_config() {
        let table = generate_roster(&GeneratorConfig {
            rows: 200,
            duplicate_rate: 0.15,
            seed: 7,
        });
        assert_eq!(table.len(), 230);
        assert_eq!(table.header.len(), 7);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let config = GeneratorConfig { rows: 50, duplicate_rate: 0.1, seed: 42 };
        let a = generate_roster(&config);
        let b = generate_roster(&config);
        assert_eq!(a.rows[0].values, b.rows[0].values);
        assert_eq!(a.rows[49].values, b.rows[49].values);
    }

    #[test]
    fn duplicates_share_identity_fields_with_a_base_record() {
        let table = generate_roster(&GeneratorConfig {
            rows: 100,
            duplicate_rate: 0.2,
            seed: 1,
        });
        for dup in &table.rows[100..] {
            let found = table.rows[..100].iter().any(|base| {
                base.value(1) == dup.value(1) && base.value(2) == dup.value(2)
            });
            assert!(found, "injected duplicate has no matching (dob, year) base");
        }
    }
}
