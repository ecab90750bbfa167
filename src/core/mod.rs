mod budget;
mod error;
mod quiz;
mod sip;
mod types;

pub use budget::{
    EMERGENCY_FUND_MONTHS, ExportError, allocate, blank_template, emergency_fund, write_csv,
};
pub use error::{CoreError, CoreResult};
pub use quiz::{QuizSession, badge, default_bank};
pub use sip::{
    DEFAULT_ANNUAL_RETURN_PERCENT, DEFAULT_MONTHLY_CONTRIBUTION, DEFAULT_YEARS,
    LUMP_DECAY_ANNUAL_RETURN_PERCENT, MAX_ANNUAL_RETURN_PERCENT, MAX_YEARS, default_rate_for,
    project,
};
pub use types::{
    AnswerFeedback, AnswerRecord, BadgeTier, BudgetLine, BudgetPlan, QuizQuestion, QuizState,
    SipInputs, SipMode, SipPoint, SipProjection, TemplateKind,
};
