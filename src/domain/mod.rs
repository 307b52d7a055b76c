//! Salary domain types: records, projections and the enums they use.

pub mod bot_usage;
pub mod enums;
pub mod pagination;
pub mod professions;
pub mod quarter;
pub mod salary;
pub mod user;

pub use bot_usage::{NewTelegramBotUsage, TelegramBotUsage, TelegramBotUsageType};
pub use enums::{CompanyType, Currency, DeveloperGrade, Gender, KazakhstanCity, Role, SalaryApproval};
pub use pagination::{PageRequest, Pageable};
pub use professions::{expand_developer_professions, LabelEntity, Profession, UserProfession};
pub use quarter::DateQuarter;
pub use salary::{
    AddSalaryRequest, CreateOrEditSalaryRecordResponse, EditSalaryRequest, SalaryRecord, UserSalaryAdminDto,
    UserSalaryDto,
};
pub use user::CurrentUser;
