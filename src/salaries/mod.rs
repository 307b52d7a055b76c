//! Salary charts: filter criteria, the predicate chain, aggregation,
//! currency rates and the service tying them to storage.

pub mod chart;
pub mod criteria;
pub mod currencies;
pub mod professions;
pub mod query;
pub mod service;

pub use chart::{SalariesChartResponse, SalariesHistoricalChartResponse};
pub use criteria::ChartFilterCriteria;
pub use currencies::{CurrencyRate, CurrencyService};
pub use professions::{ProfessionsProvider, SelectBoxItems};
pub use query::SalariesForChartQuery;
pub use service::SalariesService;
