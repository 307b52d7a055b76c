use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, FromRepr};

/// Titled lookup row: professions, skills and work industries share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntity {
    pub id: i64,
    pub title: String,
    pub hex_color: Option<String>,
}

pub type Profession = LabelEntity;

impl LabelEntity {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            hex_color: None,
        }
    }
}

/// Professions with fixed ids that the salary logic refers to directly.
///
/// The table can hold more rows; these are the ones seeded on first start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr)]
#[repr(i64)]
pub enum UserProfession {
    Developer = 1,
    QualityAssurance = 2,
    Tester = 3,
    BusinessAnalyst = 4,
    ProjectManager = 5,
    DevOps = 7,
    ProductManager = 9,
    TeamLeader = 10,
    Architect = 11,
    DataScientist = 12,
    DataAnalyst = 13,
    Designer = 14,
    HrNonIt = 25,
    BackendDeveloper = 30,
    FrontendDeveloper = 31,
    FullstackDeveloper = 32,
    MobileDeveloper = 33,
    IosDeveloper = 34,
    AndroidDeveloper = 35,
    GameDeveloper = 36,
}

impl UserProfession {
    /// Subtypes folded into a "developer" filter.
    ///
    /// Hardcoded: a new developer subtype has to be added here as well as to
    /// the `professions` table.
    pub const DEVELOPER_SUBTYPES: [UserProfession; 7] = [
        UserProfession::BackendDeveloper,
        UserProfession::FrontendDeveloper,
        UserProfession::FullstackDeveloper,
        UserProfession::MobileDeveloper,
        UserProfession::IosDeveloper,
        UserProfession::AndroidDeveloper,
        UserProfession::GameDeveloper,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn title(self) -> &'static str {
        match self {
            UserProfession::Developer => "Developer",
            UserProfession::QualityAssurance => "QA engineer",
            UserProfession::Tester => "Tester",
            UserProfession::BusinessAnalyst => "Business analyst",
            UserProfession::ProjectManager => "Project manager",
            UserProfession::DevOps => "DevOps engineer",
            UserProfession::ProductManager => "Product manager",
            UserProfession::TeamLeader => "Team lead",
            UserProfession::Architect => "Architect",
            UserProfession::DataScientist => "Data scientist",
            UserProfession::DataAnalyst => "Data analyst",
            UserProfession::Designer => "UI/UX designer",
            UserProfession::HrNonIt => "HR non-IT",
            UserProfession::BackendDeveloper => "Backend developer",
            UserProfession::FrontendDeveloper => "Frontend developer",
            UserProfession::FullstackDeveloper => "Fullstack developer",
            UserProfession::MobileDeveloper => "Mobile developer",
            UserProfession::IosDeveloper => "iOS developer",
            UserProfession::AndroidDeveloper => "Android developer",
            UserProfession::GameDeveloper => "Game developer",
        }
    }

    /// Extra lowercase phrases accepted by the bot besides the title.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            UserProfession::Developer => &["developer", "разработчик", "программист", "dev"],
            UserProfession::QualityAssurance => &["qa", "тестировщик"],
            UserProfession::Tester => &["tester"],
            UserProfession::BusinessAnalyst => &["ba", "бизнес-аналитик"],
            UserProfession::ProjectManager => &["pm", "проджект"],
            UserProfession::DevOps => &["devops", "девопс"],
            UserProfession::ProductManager => &["продакт"],
            UserProfession::TeamLeader => &["teamlead"],
            UserProfession::Architect => &["архитектор"],
            UserProfession::DataScientist => &["ds"],
            UserProfession::DataAnalyst => &["аналитик"],
            UserProfession::Designer => &["designer", "дизайнер"],
            UserProfession::HrNonIt => &[],
            UserProfession::BackendDeveloper => &["backend", "бэкенд", "бекенд", "бэк"],
            UserProfession::FrontendDeveloper => &["frontend", "фронтенд", "фронт"],
            UserProfession::FullstackDeveloper => &["fullstack", "фулстек", "фуллстек"],
            UserProfession::MobileDeveloper => &["mobile", "мобильный"],
            UserProfession::IosDeveloper => &["ios"],
            UserProfession::AndroidDeveloper => &["android", "андроид"],
            UserProfession::GameDeveloper => &["gamedev", "геймдев"],
        }
    }
}

/// Adds every developer subtype when the generic developer id is requested.
///
/// The result keeps the caller's order, appends missing subtypes in their
/// canonical order, and lists each id once.
pub fn expand_developer_professions(ids: &[i64]) -> Vec<i64> {
    let mut expanded = ids.to_vec();
    if ids.contains(&UserProfession::Developer.id()) {
        expanded.extend(UserProfession::DEVELOPER_SUBTYPES.iter().map(|p| p.id()));
    }
    expanded.into_iter().unique().collect()
}
