//! Teacher Model

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::schedule::Schedule;
use super::slot::SlotKey;
use super::TeacherId;

/// Teacher as returned by `GET teacher/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
    /// The only subject this teacher accepts bookings for
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub schedule: Schedule,
    /// Capacity shared by every slot of this teacher
    pub max_students_per_group: NonZeroU32,
}

impl Teacher {
    pub fn capacity(&self) -> u32 {
        self.max_students_per_group.get()
    }

    /// All slots published by this teacher
    pub fn slots(&self) -> Vec<SlotKey> {
        self.schedule.slots(self.id)
    }
}

/// Nested teacher summary carried by booking payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSummary {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
}

impl From<&Teacher> for TeacherSummary {
    fn from(teacher: &Teacher) -> Self {
        Self {
            id: teacher.id,
            name: teacher.name.clone(),
            subject: teacher.subject.clone(),
        }
    }
}

/// Entry of `GET rated-teacher`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedTeacher {
    pub teacher_id: TeacherId,
}
