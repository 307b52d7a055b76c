//! Free-text bot command parsing.
//!
//! The parser never fails: unknown words are skipped and the result only
//! carries what was recognised.

use itertools::Itertools;

use crate::domain::enums::{city_by_keyword, grade_by_keyword};
use crate::domain::{DeveloperGrade, KazakhstanCity, Profession, UserProfession};
use crate::salaries::criteria::ChartFilterCriteria;

/// Reply language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReplyLocale {
    #[default]
    Ru,
    En,
}

impl ReplyLocale {
    /// `en*` language codes get English, everything else the default.
    pub fn from_language_code(code: Option<&str>) -> Self {
        match code {
            Some(code) if code.trim().to_ascii_lowercase().starts_with("en") => ReplyLocale::En,
            _ => ReplyLocale::Ru,
        }
    }

    fn key_suffix(self) -> Option<&'static str> {
        match self {
            ReplyLocale::Ru => None,
            ReplyLocale::En => Some("en"),
        }
    }
}

/// Normalized filters parsed from a bot message.
///
/// Cities and professions are sorted and unique, so equal filter sets compare
/// equal and share a cache key whatever order the user typed them in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelegramBotUserCommandParameters {
    pub grade: Option<DeveloperGrade>,
    pub cities: Vec<KazakhstanCity>,
    pub professions: Vec<Profession>,
    pub locale: ReplyLocale,
}

impl TelegramBotUserCommandParameters {
    pub fn parse(text: &str, known_professions: &[Profession], language_code: Option<&str>) -> Self {
        let tokens = tokenize(text);
        let phrases = profession_phrases(known_professions);

        let mut grades = Vec::new();
        let mut cities = Vec::new();
        let mut professions: Vec<Profession> = Vec::new();

        let mut position = 0;
        while position < tokens.len() {
            let rest = &tokens[position..];
            if let Some((phrase, profession)) = phrases.iter().find(|(phrase, _)| rest.starts_with(phrase)) {
                professions.push((*profession).clone());
                position += phrase.len();
                continue;
            }

            let token = tokens[position].as_str();
            if let Some(grade) = grade_by_keyword(token) {
                grades.push(grade);
            } else if let Some(city) = city_by_keyword(token) {
                cities.push(city);
            }
            position += 1;
        }

        Self {
            grade: grades.into_iter().min(),
            cities: cities.into_iter().sorted().dedup().collect(),
            professions: professions
                .into_iter()
                .sorted_by_key(|p| p.id)
                .dedup_by(|a, b| a.id == b.id)
                .collect(),
            locale: ReplyLocale::from_language_code(language_code),
        }
    }

    pub fn profession_ids(&self) -> Vec<i64> {
        self.professions.iter().map(|p| p.id).collect()
    }

    pub fn has_any_filter(&self) -> bool {
        self.grade.is_some() || !self.cities.is_empty() || !self.professions.is_empty()
    }

    /// Cache key suffix: `{grade}_{cities}_{professionIds}`, plus `_{locale}`
    /// for non-default locales. Example: `Middle_Almaty_`.
    pub fn key_postfix(&self) -> String {
        let grade = self.grade.map(|g| g.to_string()).unwrap_or_default();
        let cities = self.cities.iter().join(",");
        let professions = self.professions.iter().map(|p| p.id).join(",");

        let mut key = format!("{}_{}_{}", grade, cities, professions);
        if let Some(suffix) = self.locale.key_suffix() {
            key.push('_');
            key.push_str(suffix);
        }
        key
    }

    pub fn to_criteria(&self) -> ChartFilterCriteria {
        ChartFilterCriteria {
            grade: self.grade,
            professions_to_include: self.profession_ids(),
            cities: self.cities.clone(),
            ..ChartFilterCriteria::default()
        }
    }
}

/// Lowercase words. Hyphens and `+`/`#` stay inside words (`c#`, `бизнес-аналитик`).
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '+' | '#' | '@')))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every way to name each known profession, longest phrase first.
fn profession_phrases(known: &[Profession]) -> Vec<(Vec<String>, &Profession)> {
    let mut phrases: Vec<(Vec<String>, &Profession)> = Vec::new();
    for profession in known {
        phrases.push((tokenize(&profession.title), profession));
        if let Some(builtin) = UserProfession::from_repr(profession.id) {
            for alias in builtin.aliases() {
                phrases.push((tokenize(alias), profession));
            }
        }
    }

    phrases.retain(|(phrase, _)| !phrase.is_empty());
    phrases.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
    phrases
}
