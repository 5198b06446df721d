// src/models/role.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of roles a signed-in caller can hold.
/// Role-dependent behavior lives here instead of being re-derived from the raw claim string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Mentor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Mentor => "mentor",
            Role::Student => "student",
        }
    }

    /// Landing page for the role's dashboard after sign-in.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Instructor => "/instructor/dashboard",
            Role::Mentor => "/mentor/dashboard",
            Role::Student => "/student/dashboard",
        }
    }

    /// Whether the role may create quizzes, add questions, or delete quizzes.
    pub fn can_author_quizzes(&self) -> bool {
        matches!(self, Role::Admin | Role::Instructor)
    }

    /// Whether quiz payloads sent to this role include correct answers.
    pub fn sees_answer_keys(&self) -> bool {
        !matches!(self, Role::Student)
    }

    /// Unfiltered listing of every quiz in the system.
    pub fn can_list_all_quizzes(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "mentor" => Ok(Role::Mentor),
            "student" => Ok(Role::Student),
            _ => Err(format!("unknown role '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_claim_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("Instructor".parse::<Role>(), Ok(Role::Instructor));
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn unknown_role_error_echoes_claim_as_given() {
        assert_eq!(
            "SuperUser".parse::<Role>(),
            Err("unknown role 'SuperUser'".to_string())
        );
    }

    #[test]
    fn each_role_has_its_own_dashboard() {
        assert_eq!(Role::Admin.dashboard_path(), "/admin/dashboard");
        assert_eq!(Role::Instructor.dashboard_path(), "/instructor/dashboard");
        assert_eq!(Role::Mentor.dashboard_path(), "/mentor/dashboard");
        assert_eq!(Role::Student.dashboard_path(), "/student/dashboard");
    }

    #[test]
    fn only_staff_author_quizzes() {
        assert!(Role::Admin.can_author_quizzes());
        assert!(Role::Instructor.can_author_quizzes());
        assert!(!Role::Mentor.can_author_quizzes());
        assert!(!Role::Student.can_author_quizzes());
        assert!(!Role::Student.sees_answer_keys());
        assert!(Role::Mentor.sees_answer_keys());
    }
}
