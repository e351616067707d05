use serde::{Deserialize, Serialize};

/// The fixed canonical vocabulary heterogeneous input headers are mapped
/// onto. Classification assigns each canonical field to at most one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    StudentName,
    DateOfBirth,
    Gender,
    Grade,
    AcademicYear,
    SchoolId,
    EnrollmentDate,
    Address,
    ContactNumber,
    EmailAddress,
}

impl CanonicalField {
    /// The standardized column name written into rewritten headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudentName => "StudentName",
            Self::DateOfBirth => "DateOfBirth",
            Self::Gender => "Gender",
            Self::Grade => "Grade",
            Self::AcademicYear => "AcademicYear",
            Self::SchoolId => "SchoolID",
            Self::EnrollmentDate => "EnrollmentDate",
            Self::Address => "Address",
            Self::ContactNumber => "ContactNumber",
            Self::EmailAddress => "EmailAddress",
        }
    }

    /// All fields, in classification priority order.
    pub const ALL: [CanonicalField; 10] = [
        Self::StudentName,
        Self::DateOfBirth,
        Self::Gender,
        Self::Grade,
        Self::AcademicYear,
        Self::SchoolId,
        Self::EnrollmentDate,
        Self::Address,
        Self::ContactNumber,
        Self::EmailAddress,
    ];
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
