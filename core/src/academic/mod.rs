//! Academic identity: department, course, year level and section.
//!
//! The formatting and lookup functions never fail; they degrade to
//! displayable fallbacks. Membership of a course in its department is only
//! checked by [`AcademicIdentity::validate`], which registration forms call
//! before submitting.

mod codes;
mod tables;

use thiserror::Error;

pub use codes::{
    format_course_year_section, normalize_section, parse_course_year, ParsedCourseYear,
    NOT_AVAILABLE,
};
pub use tables::{
    course_name, courses_for_department, department_for_course, department_name, departments,
    find_department, year_level_label, Course, Department, DEPARTMENTS,
};

pub const MAX_YEAR_LEVEL: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("unknown department: {0}")]
    UnknownDepartment(String),
    #[error("course {course} is not offered by {department}")]
    CourseNotInDepartment { department: String, course: String },
    #[error("year level must be between 1 and 5, got {0}")]
    YearLevelOutOfRange(u8),
}

/// Structured academic fields of a student account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademicIdentity {
    pub department: String,
    pub course: String,
    pub year_level: u8,
    pub section: Option<String>,
}

impl AcademicIdentity {
    /// The section is normalized (trimmed, uppercased, at most two chars).
    pub fn new(department: &str, course: &str, year_level: u8, section: Option<&str>) -> Self {
        Self {
            department: department.to_string(),
            course: course.to_string(),
            year_level,
            section: section.and_then(normalize_section),
        }
    }

    /// Legacy display string, e.g. `BSIT3A` or `BSIT 3rd Year`.
    pub fn legacy_string(&self) -> String {
        format_course_year_section(
            Some(self.course.as_str()),
            Some(self.year_level),
            self.section.as_deref(),
        )
    }

    pub fn validate(&self) -> Result<(), IdentityError> {
        let department = find_department(&self.department)
            .ok_or_else(|| IdentityError::UnknownDepartment(self.department.clone()))?;
        if !department.courses.iter().any(|c| c.code == self.course) {
            return Err(IdentityError::CourseNotInDepartment {
                department: self.department.clone(),
                course: self.course.clone(),
            });
        }
        if !(1..=MAX_YEAR_LEVEL).contains(&self.year_level) {
            return Err(IdentityError::YearLevelOutOfRange(self.year_level));
        }
        Ok(())
    }
}
