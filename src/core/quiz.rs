use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::error::{CoreResult, invalid_input, invalid_state};
use super::types::{AnswerFeedback, AnswerRecord, BadgeTier, QuizQuestion, QuizState};

struct BankEntry {
    text: &'static str,
    options: [&'static str; 4],
    answer: &'static str,
    explanation: &'static str,
}

const DEFAULT_BANK: &[BankEntry] = &[
    BankEntry {
        text: "What does SIP stand for?",
        options: [
            "Systematic Investment Plan",
            "Standard Insurance Policy",
            "Savings Interest Program",
            "Safe Investment Plan",
        ],
        answer: "Systematic Investment Plan",
        explanation: "A SIP invests a fixed amount at regular intervals, usually monthly.",
    },
    BankEntry {
        text: "Which one has more risk?",
        options: [
            "Fixed Deposit",
            "Mutual Fund",
            "Savings Account",
            "Recurring Deposit",
        ],
        answer: "Mutual Fund",
        explanation: "Mutual fund returns follow the market, deposits pay a fixed rate.",
    },
    BankEntry {
        text: "What is a credit score used for?",
        options: [
            "Checking bank balance",
            "Loan eligibility",
            "Income tax filing",
            "Tracking investments",
        ],
        answer: "Loan eligibility",
        explanation: "Lenders use the score to judge how likely you are to repay.",
    },
    BankEntry {
        text: "Which is not a tax-saving instrument?",
        options: ["PPF", "ELSS", "FD (5 years)", "Credit Card"],
        answer: "Credit Card",
        explanation: "PPF, ELSS and 5-year tax-saver FDs qualify for deductions; card spending does not.",
    },
    BankEntry {
        text: "Which one is NOT a type of mutual fund?",
        options: ["Equity Fund", "Debt Fund", "Savings Fund", "Hybrid Fund"],
        answer: "Savings Fund",
        explanation: "Funds are grouped by what they hold: equity, debt, or a hybrid of both.",
    },
    BankEntry {
        text: "If inflation increases, your money\u{2019}s value:",
        options: ["Increases", "Decreases", "Stays same", "Doubles"],
        answer: "Decreases",
        explanation: "Rising prices mean the same amount of money buys less.",
    },
    BankEntry {
        text: "UPI stands for?",
        options: [
            "Unified Payment Interface",
            "Universal Pay Info",
            "User Payment India",
            "Unique Payment ID",
        ],
        answer: "Unified Payment Interface",
        explanation: "UPI is the real-time payment system that links bank accounts to phone apps.",
    },
    BankEntry {
        text: "Best way to avoid credit card debt?",
        options: [
            "Pay minimum due",
            "Pay full bill monthly",
            "Ignore bill",
            "Get more cards",
        ],
        answer: "Pay full bill monthly",
        explanation: "Paying only the minimum leaves a balance that accrues high interest.",
    },
    BankEntry {
        text: "What is a fixed deposit?",
        options: [
            "Loan",
            "Insurance",
            "Investment for fixed time",
            "Mutual fund",
        ],
        answer: "Investment for fixed time",
        explanation: "An FD locks money with a bank for a set term at a set interest rate.",
    },
    BankEntry {
        text: "Which one gives ownership in a company?",
        options: ["Bond", "FD", "Stock", "PPF"],
        answer: "Stock",
        explanation: "A share of stock is a slice of the company; a bond is a loan to it.",
    },
];

pub fn default_bank() -> Arc<[QuizQuestion]> {
    DEFAULT_BANK
        .iter()
        .map(|entry| QuizQuestion {
            text: entry.text.to_string(),
            options: entry.options.iter().map(|o| (*o).to_string()).collect(),
            correct_answer: entry.answer.to_string(),
            explanation: Some(entry.explanation.to_string()),
        })
        .collect()
}

impl QuizQuestion {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: Option<String>,
    ) -> CoreResult<Self> {
        let text = text.into();
        let correct_answer = correct_answer.into();
        if options.len() < 2 {
            return Err(invalid_input(format!(
                "question '{text}' needs at least two options"
            )));
        }
        let mut seen = HashSet::new();
        if !options.iter().all(|option| seen.insert(option.as_str())) {
            return Err(invalid_input(format!(
                "question '{text}' has duplicate options"
            )));
        }
        if !options.contains(&correct_answer) {
            return Err(invalid_input(format!(
                "correct answer for '{text}' is not one of its options"
            )));
        }
        Ok(Self {
            text,
            options,
            correct_answer,
            explanation,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

pub fn badge(score_percent: u8) -> BadgeTier {
    match score_percent {
        90.. => BadgeTier::Top,
        70..=89 => BadgeTier::Second,
        50..=69 => BadgeTier::Third,
        _ => BadgeTier::Lowest,
    }
}

/// One attempt at a question bank. The bank is shared and never reordered;
/// `restart` clears progress but keeps the same bank.
#[derive(Debug, Clone)]
pub struct QuizSession {
    bank: Arc<[QuizQuestion]>,
    state: QuizState,
    correct_count: usize,
    answer_log: Vec<AnswerRecord>,
}

impl QuizSession {
    pub fn new(bank: Arc<[QuizQuestion]>) -> CoreResult<Self> {
        if bank.is_empty() {
            return Err(invalid_input("question bank must not be empty"));
        }
        Ok(Self {
            bank,
            state: QuizState::AwaitingAnswer(0),
            correct_count: 0,
            answer_log: Vec::new(),
        })
    }

    pub fn bank(&self) -> &[QuizQuestion] {
        &self.bank
    }

    pub fn shares_bank_with(&self, other: &QuizSession) -> bool {
        Arc::ptr_eq(&self.bank, &other.bank)
    }

    pub fn len(&self) -> usize {
        self.bank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bank.is_empty()
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == QuizState::Completed
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    /// (answered, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.answer_log.len(), self.bank.len())
    }

    pub fn wrong_answers(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.answer_log.iter().filter(|record| !record.is_correct)
    }

    pub fn current_question(&self) -> Option<(usize, &QuizQuestion)> {
        match self.state {
            QuizState::AwaitingAnswer(index) => self.bank.get(index).map(|q| (index, q)),
            QuizState::Completed => None,
        }
    }

    pub fn submit_answer(&mut self, chosen: &str) -> CoreResult<AnswerFeedback> {
        let QuizState::AwaitingAnswer(index) = self.state else {
            return Err(invalid_state("quiz is already completed"));
        };
        let question = &self.bank[index];
        let is_correct = chosen == question.correct_answer;
        if is_correct {
            self.correct_count += 1;
        }
        self.answer_log.push(AnswerRecord {
            question_index: index,
            question: question.text.clone(),
            chosen: chosen.to_string(),
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
            is_correct,
        });
        let feedback_answer = question.correct_answer.clone();
        let feedback_explanation = question.explanation.clone();

        self.state = if index + 1 == self.bank.len() {
            QuizState::Completed
        } else {
            QuizState::AwaitingAnswer(index + 1)
        };
        debug!(index, is_correct, state = ?self.state, "quiz answer recorded");

        Ok(AnswerFeedback {
            is_correct,
            correct_answer: feedback_answer,
            explanation: feedback_explanation,
            state: self.state,
        })
    }

    /// Like `submit_answer`, but rejects an answer aimed at any question other
    /// than the current one, so a repeated submit for the same question fails.
    pub fn submit_answer_at(
        &mut self,
        question_index: usize,
        chosen: &str,
    ) -> CoreResult<AnswerFeedback> {
        match self.state {
            QuizState::AwaitingAnswer(index) if index == question_index => {
                self.submit_answer(chosen)
            }
            QuizState::AwaitingAnswer(index) => Err(invalid_state(format!(
                "question {question_index} is not awaiting an answer (current question is {index})"
            ))),
            QuizState::Completed => Err(invalid_state("quiz is already completed")),
        }
    }

    pub fn restart(&mut self) {
        self.state = QuizState::AwaitingAnswer(0);
        self.correct_count = 0;
        self.answer_log.clear();
    }

    pub fn score_percent(&self) -> CoreResult<u8> {
        if !self.is_completed() {
            return Err(invalid_state("score is only available once the quiz is completed"));
        }
        let ratio = self.correct_count as f64 / self.bank.len() as f64;
        Ok((ratio * 100.0).round() as u8)
    }
}
