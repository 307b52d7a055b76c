//! Enumerations shared by salary records, chart filters and bot replies.
//!
//! Every enum is stored as its integer discriminant and serialized by name.
//! Parsing from strings is case-insensitive and also accepts the discriminant.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoEnumIterator};

use crate::core::error::{AppError, AppResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(i64)]
pub enum DeveloperGrade {
    Unknown = 0,
    Junior = 1,
    Middle = 2,
    Senior = 3,
    Lead = 4,
}

impl DeveloperGrade {
    /// Grades that get their own row in charts and bot replies.
    pub const CHART_GRADES: [DeveloperGrade; 4] = [
        DeveloperGrade::Junior,
        DeveloperGrade::Middle,
        DeveloperGrade::Senior,
        DeveloperGrade::Lead,
    ];

    /// Words users type for this grade, lowercase
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            DeveloperGrade::Unknown => &[],
            DeveloperGrade::Junior => &["junior", "jun", "джун", "джуниор", "джуны"],
            DeveloperGrade::Middle => &["middle", "mid", "мидл", "миддл", "мидлы"],
            DeveloperGrade::Senior => &["senior", "сеньор", "синьор", "сеньоры", "синьоры"],
            DeveloperGrade::Lead => &["lead", "лид", "тимлид", "лиды"],
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(i64)]
pub enum CompanyType {
    #[default]
    Local = 1,
    Foreign = 2,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(i64)]
pub enum Currency {
    /// Base currency of the exchange-rate feed
    #[default]
    KZT = 1,
    USD = 2,
    EUR = 3,
    RUB = 4,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::KZT => "₸",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::RUB => "₽",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, FromRepr)]
#[strum(ascii_case_insensitive)]
#[repr(i64)]
pub enum Gender {
    Female = 1,
    Male = 2,
    PreferNotToSay = 3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter, FromRepr,
)]
#[strum(ascii_case_insensitive)]
#[repr(i64)]
pub enum KazakhstanCity {
    Almaty = 1,
    Astana = 2,
    Shymkent = 3,
    Karaganda = 4,
    Aktobe = 5,
    Taraz = 6,
    Pavlodar = 7,
    UstKamenogorsk = 8,
    Semey = 9,
    Atyrau = 10,
    Kostanay = 11,
    Kyzylorda = 12,
    Oral = 13,
    Petropavl = 14,
    Aktau = 15,
}

impl KazakhstanCity {
    /// Words users type for this city, lowercase
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            KazakhstanCity::Almaty => &["almaty", "алматы", "алмата", "алма-ата"],
            KazakhstanCity::Astana => &["astana", "астана", "nur-sultan", "нур-султан"],
            KazakhstanCity::Shymkent => &["shymkent", "шымкент", "чимкент"],
            KazakhstanCity::Karaganda => &["karaganda", "караганда", "qaraghandy"],
            KazakhstanCity::Aktobe => &["aktobe", "актобе"],
            KazakhstanCity::Taraz => &["taraz", "тараз"],
            KazakhstanCity::Pavlodar => &["pavlodar", "павлодар"],
            KazakhstanCity::UstKamenogorsk => &["ust-kamenogorsk", "усть-каменогорск", "oskemen", "оскемен"],
            KazakhstanCity::Semey => &["semey", "семей"],
            KazakhstanCity::Atyrau => &["atyrau", "атырау"],
            KazakhstanCity::Kostanay => &["kostanay", "костанай"],
            KazakhstanCity::Kyzylorda => &["kyzylorda", "кызылорда"],
            KazakhstanCity::Oral => &["oral", "uralsk", "орал", "уральск"],
            KazakhstanCity::Petropavl => &["petropavl", "petropavlovsk", "петропавловск"],
            KazakhstanCity::Aktau => &["aktau", "актау"],
        }
    }

    pub fn ru_name(self) -> &'static str {
        match self {
            KazakhstanCity::Almaty => "Алматы",
            KazakhstanCity::Astana => "Астана",
            KazakhstanCity::Shymkent => "Шымкент",
            KazakhstanCity::Karaganda => "Караганда",
            KazakhstanCity::Aktobe => "Актобе",
            KazakhstanCity::Taraz => "Тараз",
            KazakhstanCity::Pavlodar => "Павлодар",
            KazakhstanCity::UstKamenogorsk => "Усть-Каменогорск",
            KazakhstanCity::Semey => "Семей",
            KazakhstanCity::Atyrau => "Атырау",
            KazakhstanCity::Kostanay => "Костанай",
            KazakhstanCity::Kyzylorda => "Кызылорда",
            KazakhstanCity::Oral => "Орал",
            KazakhstanCity::Petropavl => "Петропавловск",
            KazakhstanCity::Aktau => "Актау",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    #[default]
    Member,
    Admin,
}

/// Moderation state of a salary record
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, FromRepr,
)]
#[repr(i64)]
pub enum SalaryApproval {
    #[default]
    Pending = 0,
    Approved = 1,
    Excluded = 2,
}

/// Parses an enum from either its name or its integer discriminant.
///
/// # Errors
/// Returns [`AppError::Validation`] naming `field` when neither form matches.
pub fn parse_enum<T>(field: &str, raw: &str, from_repr: fn(i64) -> Option<T>) -> AppResult<T>
where
    T: std::str::FromStr,
{
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<T>() {
        return Ok(value);
    }
    trimmed
        .parse::<i64>()
        .ok()
        .and_then(from_repr)
        .ok_or_else(|| AppError::Validation(format!("Invalid value '{}' for '{}'", raw, field)))
}

/// Looks an enum up by discriminant, failing with a database-flavoured
/// message; used when mapping stored rows.
pub fn from_stored<T>(column: &str, raw: i64, from_repr: fn(i64) -> Option<T>) -> rusqlite::Result<T> {
    from_repr(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Integer,
            format!("unknown value {} in column {}", raw, column).into(),
        )
    })
}

/// Case-insensitive keyword lookup over every city.
pub fn city_by_keyword(token: &str) -> Option<KazakhstanCity> {
    KazakhstanCity::iter().find(|city| city.keywords().contains(&token))
}

/// Case-insensitive keyword lookup over the chart grades.
pub fn grade_by_keyword(token: &str) -> Option<DeveloperGrade> {
    DeveloperGrade::CHART_GRADES
        .into_iter()
        .find(|grade| grade.keywords().contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enum_accepts_name_and_id() {
        assert_eq!(
            parse_enum("grade", "senior", DeveloperGrade::from_repr).unwrap(),
            DeveloperGrade::Senior
        );
        assert_eq!(
            parse_enum("grade", "2", DeveloperGrade::from_repr).unwrap(),
            DeveloperGrade::Middle
        );
        assert_eq!(
            parse_enum("cities", "Almaty", KazakhstanCity::from_repr).unwrap(),
            KazakhstanCity::Almaty
        );
    }

    #[test]
    fn test_parse_enum_rejects_garbage() {
        let err = parse_enum("grade", "wizard", DeveloperGrade::from_repr).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("grade")));
        assert!(parse_enum("grade", "99", DeveloperGrade::from_repr).is_err());
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(city_by_keyword("алматы"), Some(KazakhstanCity::Almaty));
        assert_eq!(city_by_keyword("nur-sultan"), Some(KazakhstanCity::Astana));
        assert_eq!(grade_by_keyword("мидл"), Some(DeveloperGrade::Middle));
        assert_eq!(grade_by_keyword("unknown"), None);
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for city in KazakhstanCity::iter() {
            for keyword in city.keywords() {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
        for grade in DeveloperGrade::iter() {
            for keyword in grade.keywords() {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }
}
