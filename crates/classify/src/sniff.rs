use std::collections::HashSet;

use chrono::NaiveDate;
use regex::Regex;
use rosterkit_core::CanonicalField;

/// Date formats the date-likeness detector attempts, most common first.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
];

const GENDER_VALUES: [&str; 6] = ["m", "f", "male", "female", "other", "non-binary"];

/// Content-based detectors for still-unmapped columns. Each works on a
/// sample of the column's non-empty values and answers likeness with fixed
/// thresholds. An empty sample never matches anything.
pub struct ContentDetectors {
    year_pattern: Regex,
    school_keyword: Regex,
    school_code: Regex,
    grade_keyword: Regex,
    digit_extract: Regex,
    email_pattern: Regex,
}

impl ContentDetectors {
    pub fn new() -> Self {
        Self {
            year_pattern: Regex::new(r"^(19|20)\d{2}([-/_](19|20)?\d{2})?$").unwrap(),
            school_keyword: Regex::new(r"(?i)sch|school|college|academy|institute").unwrap(),
            school_code: Regex::new(r"^[A-Za-z]{2,5}\d+$").unwrap(),
            grade_keyword: Regex::new(r"(?i)grade|class|level").unwrap(),
            digit_extract: Regex::new(r"\d+").unwrap(),
            email_pattern: Regex::new(r"@.*\.").unwrap(),
        }
    }

    /// Run all detectors in priority order; first hit wins.
    ///
    /// Enrollment dates are deliberately absent: content alone cannot tell
    /// an enrollment date from a birth date, so the first date-likeness hit
    /// maps to DateOfBirth and EnrollmentDate is assignable via headers only.
    pub fn detect(&self, sample: &[&str]) -> Option<CanonicalField> {
        if sample.is_empty() {
            return None;
        }
        if self.is_name(sample) {
            Some(CanonicalField::StudentName)
        } else if self.is_date(sample) {
            Some(CanonicalField::DateOfBirth)
        } else if self.is_gender(sample) {
            Some(CanonicalField::Gender)
        } else if self.is_grade(sample) {
            Some(CanonicalField::Grade)
        } else if self.is_year(sample) {
            Some(CanonicalField::AcademicYear)
        } else if self.is_school(sample) {
            Some(CanonicalField::SchoolId)
        } else if self.is_contact(sample) {
            Some(CanonicalField::ContactNumber)
        } else if self.is_email(sample) {
            Some(CanonicalField::EmailAddress)
        } else {
            None
        }
    }

    /// >=70% of the sample have >=2 whitespace tokens and the mean
    /// alphabetic-character ratio is >=80%.
    fn is_name(&self, sample: &[&str]) -> bool {
        let multi_word = fraction(sample, |v| v.split_whitespace().count() >= 2);
        let mean_alpha: f64 = sample
            .iter()
            .map(|v| {
                let total = v.chars().count();
                if total == 0 {
                    return 0.0;
                }
                let alpha = v.chars().filter(|c| c.is_alphabetic() || c.is_whitespace()).count();
                alpha as f64 / total as f64
            })
            .sum::<f64>()
            / sample.len() as f64;

        multi_word > 0.7 && mean_alpha > 0.8
    }

    fn is_date(&self, sample: &[&str]) -> bool {
        fraction(sample, |v| parse_date(v).is_some()) > 0.8
    }

    fn is_gender(&self, sample: &[&str]) -> bool {
        let lowered: Vec<String> = sample.iter().map(|v| v.trim().to_lowercase()).collect();
        let distinct: HashSet<&str> = lowered.iter().map(String::as_str).collect();
        if distinct.is_empty() || distinct.len() > 5 {
            return false;
        }
        let known = lowered.iter().filter(|v| GENDER_VALUES.contains(&v.as_str())).count();
        known as f64 / lowered.len() as f64 > 0.8
    }

    fn is_grade(&self, sample: &[&str]) -> bool {
        if distinct_count(sample) >= 20 {
            return false;
        }
        let numeric = fraction(sample, |v| self.digit_extract.is_match(v));
        let keyword = fraction(sample, |v| self.grade_keyword.is_match(v));
        numeric > 0.5 || keyword > 0.3
    }

    fn is_year(&self, sample: &[&str]) -> bool {
        distinct_count(sample) < 10 && fraction(sample, |v| self.year_pattern.is_match(v.trim())) >= 0.5
    }

    fn is_school(&self, sample: &[&str]) -> bool {
        fraction(sample, |v| self.school_keyword.is_match(v)) >= 0.3
            || fraction(sample, |v| self.school_code.is_match(v.trim())) >= 0.5
    }

    /// >=80% of values carry at least 8 digit characters once everything
    /// else is stripped.
    fn is_contact(&self, sample: &[&str]) -> bool {
        fraction(sample, |v| v.chars().filter(char::is_ascii_digit).count() >= 8) > 0.8
    }

    fn is_email(&self, sample: &[&str]) -> bool {
        fraction(sample, |v| self.email_pattern.is_match(v)) > 0.7
    }
}

impl Default for ContentDetectors {
    fn default() -> Self {
        Self::new()
    }
}

fn fraction(sample: &[&str], pred: impl Fn(&str) -> bool) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().filter(|v| pred(v)).count() as f64 / sample.len() as f64
}

fn distinct_count(sample: &[&str]) -> usize {
    sample
        .iter()
        .map(|v| v.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
}
