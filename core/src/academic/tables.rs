//! Static department and course tables with forgiving lookups.
//!
//! Every lookup falls back to something displayable (the raw code or a
//! generic label) instead of failing.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Course {
    pub code: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Department {
    pub code: &'static str,
    pub name: &'static str,
    pub courses: &'static [Course],
}

pub static DEPARTMENTS: &[Department] = &[
    Department {
        code: "CCS",
        name: "College of Computer Studies",
        courses: &[
            Course { code: "BSIT", name: "Bachelor of Science in Information Technology" },
            Course { code: "BSCS", name: "Bachelor of Science in Computer Science" },
            Course { code: "BSIS", name: "Bachelor of Science in Information Systems" },
        ],
    },
    Department {
        code: "CBA",
        name: "College of Business and Accountancy",
        courses: &[
            Course { code: "BSA", name: "Bachelor of Science in Accountancy" },
            Course { code: "BSBA", name: "Bachelor of Science in Business Administration" },
            Course { code: "BSMA", name: "Bachelor of Science in Management Accounting" },
        ],
    },
    Department {
        code: "COE",
        name: "College of Engineering",
        courses: &[
            Course { code: "BSCE", name: "Bachelor of Science in Civil Engineering" },
            Course { code: "BSEE", name: "Bachelor of Science in Electrical Engineering" },
            Course { code: "BSME", name: "Bachelor of Science in Mechanical Engineering" },
            Course { code: "BSCPE", name: "Bachelor of Science in Computer Engineering" },
        ],
    },
    Department {
        code: "CAS",
        name: "College of Arts and Sciences",
        courses: &[
            Course { code: "ABCOMM", name: "Bachelor of Arts in Communication" },
            Course { code: "BSPSYCH", name: "Bachelor of Science in Psychology" },
            Course { code: "BSBIO", name: "Bachelor of Science in Biology" },
        ],
    },
    Department {
        code: "CON",
        name: "College of Nursing",
        courses: &[Course { code: "BSN", name: "Bachelor of Science in Nursing" }],
    },
    Department {
        code: "CED",
        name: "College of Education",
        courses: &[
            Course { code: "BEED", name: "Bachelor of Elementary Education" },
            Course { code: "BSED", name: "Bachelor of Secondary Education" },
            Course { code: "BPED", name: "Bachelor of Physical Education" },
        ],
    },
    Department {
        code: "CHTM",
        name: "College of Hospitality and Tourism Management",
        courses: &[
            Course { code: "BSHM", name: "Bachelor of Science in Hospitality Management" },
            Course { code: "BSTM", name: "Bachelor of Science in Tourism Management" },
        ],
    },
    Department {
        code: "CCJE",
        name: "College of Criminal Justice Education",
        courses: &[Course { code: "BSCRIM", name: "Bachelor of Science in Criminology" }],
    },
];

const YEAR_LEVEL_LABELS: [&str; 5] = ["1st Year", "2nd Year", "3rd Year", "4th Year", "5th Year"];

pub fn departments() -> &'static [Department] {
    DEPARTMENTS
}

pub fn find_department(code: &str) -> Option<&'static Department> {
    DEPARTMENTS.iter().find(|d| d.code == code)
}

/// Display name of a department, or the code itself when unknown.
pub fn department_name(code: &str) -> String {
    find_department(code)
        .map(|d| d.name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Courses offered by a department; empty for an unknown code.
pub fn courses_for_department(code: &str) -> &'static [Course] {
    find_department(code).map(|d| d.courses).unwrap_or(&[])
}

/// Display name of a course within a department, or the course code when
/// the pair is unknown.
pub fn course_name(department: &str, course: &str) -> String {
    courses_for_department(department)
        .iter()
        .find(|c| c.code == course)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| course.to_string())
}

/// The department that offers `course`, if any.
pub fn department_for_course(course: &str) -> Option<&'static Department> {
    DEPARTMENTS
        .iter()
        .find(|d| d.courses.iter().any(|c| c.code == course))
}

/// "1st Year" through "5th Year"; any other level reads "<n>th Year".
pub fn year_level_label(level: u8) -> String {
    match level {
        1..=5 => YEAR_LEVEL_LABELS[usize::from(level) - 1].to_string(),
        n => format!("{n}th Year"),
    }
}
