use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SipMode {
    AnnuityDue,
    LumpDecay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipInputs {
    pub monthly_contribution: f64,
    pub annual_return_percent: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPoint {
    pub month: u32,
    pub invested: f64,
    pub wealth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipProjection {
    pub mode: SipMode,
    pub invested_total: f64,
    pub final_value: f64,
    pub gain: f64,
    pub series: Vec<SipPoint>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    FiftyThirtyTwenty,
    BasicEssentials,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPlan {
    pub income: f64,
    pub template: TemplateKind,
    pub lines: Vec<BudgetLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) explanation: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", content = "index", rename_all = "kebab-case")]
pub enum QuizState {
    AwaitingAnswer(usize),
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_index: usize,
    pub question: String,
    pub chosen: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub state: QuizState,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Top,
    Second,
    Third,
    Lowest,
}

impl BadgeTier {
    pub fn ordinal(self) -> u8 {
        match self {
            BadgeTier::Top => 0,
            BadgeTier::Second => 1,
            BadgeTier::Third => 2,
            BadgeTier::Lowest => 3,
        }
    }
}
