use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::core::{
    BadgeTier, CoreError, DEFAULT_MONTHLY_CONTRIBUTION, DEFAULT_YEARS, ExportError, QuizSession,
    SipInputs, SipMode, TemplateKind, allocate, badge, default_bank, default_rate_for,
    emergency_fund, project, write_csv,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliSipMode {
    AnnuityDue,
    LumpDecay,
}

impl From<CliSipMode> for SipMode {
    fn from(value: CliSipMode) -> Self {
        match value {
            CliSipMode::AnnuityDue => SipMode::AnnuityDue,
            CliSipMode::LumpDecay => SipMode::LumpDecay,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliTemplateKind {
    FiftyThirtyTwenty,
    BasicEssentials,
    Custom,
}

impl From<CliTemplateKind> for TemplateKind {
    fn from(value: CliTemplateKind) -> Self {
        match value {
            CliTemplateKind::FiftyThirtyTwenty => TemplateKind::FiftyThirtyTwenty,
            CliTemplateKind::BasicEssentials => TemplateKind::BasicEssentials,
            CliTemplateKind::Custom => TemplateKind::Custom,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "finbuddy",
    about = "Financial Buddy: SIP calculator, budgeting templates and a financial literacy quiz"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the web app and JSON API
    Serve {
        #[arg(long, env = "FINBUDDY_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "FINBUDDY_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Project SIP growth
    Sip {
        #[arg(long, default_value_t = DEFAULT_MONTHLY_CONTRIBUTION)]
        monthly: f64,
        #[arg(
            long,
            help = "Expected annual return in percent; defaults to 12 (annuity-due) or 15 (lump-decay)"
        )]
        rate: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_YEARS)]
        years: u32,
        #[arg(long, value_enum, default_value_t = CliSipMode::AnnuityDue)]
        mode: CliSipMode,
        #[arg(long, help = "Print the full projection as JSON")]
        json: bool,
    },
    /// Split income across a budget template
    Budget {
        #[arg(long)]
        income: f64,
        #[arg(long, value_enum, default_value_t = CliTemplateKind::FiftyThirtyTwenty)]
        template: CliTemplateKind,
        #[arg(
            long = "category",
            value_parser = parse_category,
            help = "Custom category as NAME=AMOUNT; repeat for each category"
        )]
        categories: Vec<(String, f64)>,
        #[arg(long, help = "Write the plan as CSV instead of a table")]
        csv: bool,
    },
    /// Six months of average expenses
    EmergencyFund {
        #[arg(long)]
        monthly_expenses: f64,
    },
    /// Take the financial literacy quiz in the terminal
    Quiz,
}

fn parse_category(raw: &str) -> Result<(String, f64), String> {
    let Some((name, amount)) = raw.split_once('=') else {
        return Err(format!("expected NAME=AMOUNT, got '{raw}'"));
    };
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    Ok((name.trim().to_string(), amount))
}

pub fn serve_addr(host: IpAddr, port: u16) -> SocketAddr {
    SocketAddr::new(host, port)
}

pub fn run_sip(
    monthly: f64,
    rate: Option<f64>,
    years: u32,
    mode: SipMode,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let inputs = SipInputs {
        monthly_contribution: monthly,
        annual_return_percent: rate.unwrap_or_else(|| default_rate_for(mode)),
        years,
    };
    let projection = project(&inputs, mode)?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &projection)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "Invested Amount: {}", format_money(projection.invested_total))?;
    writeln!(
        out,
        "Total Value (Future Wealth): {}",
        format_money(projection.final_value)
    )?;
    writeln!(out, "Total Gain: {}", format_money(projection.gain))?;
    Ok(())
}

pub fn run_budget(
    income: f64,
    template: TemplateKind,
    categories: &[(String, f64)],
    csv: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let custom = (!categories.is_empty()).then_some(categories);
    let plan = allocate(income, template, custom)?;
    if csv {
        write_csv(&plan, &mut *out)?;
        return Ok(());
    }
    let width = plan
        .lines
        .iter()
        .map(|line| line.category.len())
        .max()
        .unwrap_or(0)
        .max("Remaining".len());
    for line in &plan.lines {
        writeln!(
            out,
            "{:<width$}  {:>14}  {:>5.1}%",
            line.category,
            format_money(line.amount),
            plan.share_of_income(line)
        )?;
    }
    writeln!(out, "{}", "-".repeat(width + 24))?;
    writeln!(
        out,
        "{:<width$}  {:>14}",
        "Allocated",
        format_money(plan.total_allocated())
    )?;
    writeln!(
        out,
        "{:<width$}  {:>14}",
        "Remaining",
        format_money(plan.remaining())
    )?;
    Ok(())
}

pub fn run_emergency_fund(monthly_expenses: f64, out: &mut impl Write) -> Result<(), CliError> {
    let target = emergency_fund(monthly_expenses)?;
    writeln!(out, "Emergency fund target: {}", format_money(target))?;
    Ok(())
}

pub fn badge_label(tier: BadgeTier) -> &'static str {
    match tier {
        BadgeTier::Top => "Finance Guru",
        BadgeTier::Second => "Money Smart",
        BadgeTier::Third => "Getting There",
        BadgeTier::Lowest => "Keep Learning",
    }
}

/// Drives a quiz session from line-based input. Each answer may be the
/// option number or the option text; anything else is recorded as given.
pub fn run_quiz(input: &mut impl BufRead, out: &mut impl Write) -> Result<(), CliError> {
    let mut session = QuizSession::new(default_bank())?;
    loop {
        while let Some((index, question)) = session.current_question() {
            writeln!(out, "Q{}. {}", index + 1, question.text())?;
            for (n, option) in question.options().iter().enumerate() {
                writeln!(out, "  {}) {option}", n + 1)?;
            }
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = read_line(input)? else {
                writeln!(out)?;
                return Ok(());
            };
            let choice = line
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|n| question.options().get(n))
                .cloned()
                .unwrap_or(line);

            let feedback = session.submit_answer(&choice)?;
            if feedback.is_correct {
                writeln!(out, "Correct!")?;
            } else {
                writeln!(out, "Not quite. Correct answer: {}", feedback.correct_answer)?;
            }
            if let Some(explanation) = &feedback.explanation {
                writeln!(out, "  {explanation}")?;
            }
            writeln!(out)?;
        }

        let score = session.score_percent()?;
        writeln!(
            out,
            "You scored {} out of {} ({score}%) - {}",
            session.correct_count(),
            session.len(),
            badge_label(badge(score))
        )?;
        let wrong: Vec<_> = session.wrong_answers().collect();
        if !wrong.is_empty() {
            writeln!(out, "Here are the questions you got wrong:")?;
            for record in wrong {
                writeln!(out, "- {}", record.question)?;
                writeln!(out, "  Your answer: {}", record.chosen)?;
                writeln!(out, "  Correct answer: {}", record.correct_answer)?;
            }
        }

        write!(out, "Retake quiz? [y/N] ")?;
        out.flush()?;
        match read_line(input)? {
            Some(answer) if answer.eq_ignore_ascii_case("y") => {
                session.restart();
                writeln!(out)?;
            }
            _ => return Ok(()),
        }
    }
}

fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn format_money(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}
