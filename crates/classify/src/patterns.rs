use regex::Regex;
use rosterkit_core::CanonicalField;

/// Ordered header pattern lists. Headers are matched lowercased and trimmed;
/// the first canonical field whose list matches wins the column.
pub struct HeaderPatterns {
    entries: Vec<(CanonicalField, Vec<Regex>)>,
}

impl HeaderPatterns {
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("invalid builtin header pattern"))
                .collect()
        };

        let entries = vec![
            (
                CanonicalField::StudentName,
                compile(&[
                    r"^(?:student|pupil|learner)?[\s_]*(?:full[\s_]*)?name$",
                    r"^(?:first[\s_]*name|f[\s_]*name)$",
                    r"^(?:last[\s_]*name|l[\s_]*name|surname)$",
                ]),
            ),
            (
                CanonicalField::DateOfBirth,
                compile(&[
                    r"^(?:date[\s_]*of[\s_]*birth|dob|birth[\s_]*date|birthdate)$",
                    r"^birth$",
                ]),
            ),
            (CanonicalField::Gender, compile(&[r"^(?:gender|sex)$"])),
            (CanonicalField::Grade, compile(&[r"^(?:grade|class|level|std)$"])),
            (
                CanonicalField::AcademicYear,
                compile(&[r"^(?:academic[\s_]*year|school[\s_]*year|year|yr|session|term)$"]),
            ),
            (
                CanonicalField::SchoolId,
                compile(&[r"^(?:school|institution|center)[\s_]*(?:name|id|code)?$"]),
            ),
            (
                CanonicalField::EnrollmentDate,
                compile(&[r"^(?:enrollment|registration|admission)[\s_]*(?:date|day)?$"]),
            ),
            (
                CanonicalField::Address,
                compile(&[r"^(?:address|location|residence)$"]),
            ),
            (
                CanonicalField::ContactNumber,
                compile(&[r"^(?:contact|phone|mobile|tel|telephone|cell)[\s_]*(?:number|no|#)?$"]),
            ),
            (
                CanonicalField::EmailAddress,
                compile(&[r"^(?:email|e-mail|mail)[\s_]*(?:address)?$"]),
            ),
        ];

        Self { entries }
    }

    /// First canonical field whose pattern list matches the normalized header.
    pub fn match_header(&self, header: &str) -> Option<CanonicalField> {
        let norm = header.trim().to_lowercase();
        for (field, patterns) in &self.entries {
            if patterns.iter().any(|p| p.is_match(&norm)) {
                return Some(*field);
            }
        }
        None
    }
}

impl Default for HeaderPatterns {
    fn default() -> Self {
        Self::new()
    }
}
