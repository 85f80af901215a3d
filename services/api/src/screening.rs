use crate::client::{ApplicantAnswers, PredictOutcome, ScoringClient};
use crate::console::ConsoleInput;
use clap::Args;
use loan_offers::config::AppConfig;
use loan_offers::error::AppError;
use loan_offers::telemetry;
use loan_offers::workflows::notification::{
    DispatchOutcome, MailTransport, NotificationDispatcher,
};
use loan_offers::workflows::scoring::{PredictResponse, Tier};
use std::io::{self, BufRead, Write};
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// Scoring service base URL (defaults to SCORING_URL or http://localhost:8000)
    #[arg(long)]
    pub(crate) url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct NotifyArgs {
    /// Offer tier: vip_promo, standard, or high_recall
    #[arg(long)]
    pub(crate) tier: String,
    /// Recipient email address
    #[arg(long)]
    pub(crate) email: String,
    /// Recipient full name
    #[arg(long)]
    pub(crate) name: String,
}

/// How the notification step of a screening session ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NotificationStatus {
    NotOffered,
    Skipped,
    Sent { status_code: u16 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScreeningSession {
    pub(crate) tier: Option<Tier>,
    pub(crate) notification: NotificationStatus,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let base_url = args.url.unwrap_or(config.client.scoring_url);
    let client = ScoringClient::new(&base_url)?;
    let dispatcher = NotificationDispatcher::from_config(&config.notification)?;
    let mut console = ConsoleInput::stdio();

    let session = run_session(&mut console, &client, &dispatcher).await?;
    info!(tier = ?session.tier, notification = ?session.notification, "screening finished");
    Ok(())
}

pub(crate) async fn run_notify(args: NotifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let dispatcher = NotificationDispatcher::from_config(&config.notification)?;
    let outcome = dispatcher
        .dispatch(&args.tier, true, &args.email, &args.name)
        .await?;

    match outcome {
        DispatchOutcome::Sent {
            status_code,
            message_id,
            sent_at,
        } => println!(
            "Offer email sent (status {status_code}, message id {}, at {sent_at})",
            message_id.as_deref().unwrap_or("n/a")
        ),
        DispatchOutcome::Skipped => println!("Offer email skipped"),
    }
    Ok(())
}

/// One interactive screening: collect answers, score them, and offer to email the result.
///
/// A rejected scoring request or a failed email is reported to the operator and ends the
/// session normally.
pub(crate) async fn run_session<R, W, T>(
    console: &mut ConsoleInput<R, W>,
    client: &ScoringClient,
    dispatcher: &NotificationDispatcher<T>,
) -> Result<ScreeningSession, AppError>
where
    R: BufRead,
    W: Write,
    T: MailTransport + 'static,
{
    let answers = collect_answers(console)?;

    let response = match client.predict(answers.features()).await? {
        PredictOutcome::Scored(response) => response,
        PredictOutcome::Rejected { status, detail } => {
            console.say(&format!("Error: {status} {detail}"))?;
            return Ok(ScreeningSession {
                tier: None,
                notification: NotificationStatus::NotOffered,
            });
        }
    };

    let tier = response.result.tier();
    render_response(console.output(), &response, tier)?;

    if !tier.is_offer() {
        return Ok(ScreeningSession {
            tier: Some(tier),
            notification: NotificationStatus::NotOffered,
        });
    }

    let consent = console.ask_yes_no("\nDo you want to send an email to this client? (Y/N): ")?;
    let (name, email) = if consent {
        let name = console.ask_line("Enter your full name: ")?;
        let email = console.ask_email("Enter your email: ")?;
        (name, email)
    } else {
        (String::new(), String::new())
    };

    let notification = match dispatcher.dispatch(tier.key(), consent, &email, &name).await {
        Ok(DispatchOutcome::Skipped) => NotificationStatus::Skipped,
        Ok(DispatchOutcome::Sent { status_code, .. }) => {
            console.say(&format!("Offer email sent (status {status_code})."))?;
            NotificationStatus::Sent { status_code }
        }
        Err(err) => {
            console.say(&format!("Email send failed: {err}"))?;
            NotificationStatus::Failed(err.to_string())
        }
    };

    Ok(ScreeningSession {
        tier: Some(tier),
        notification,
    })
}

fn collect_answers<R: BufRead, W: Write>(
    console: &mut ConsoleInput<R, W>,
) -> io::Result<ApplicantAnswers> {
    console.say("\n=== Loan Acceptance Screening ===")?;
    let income = console.ask_float("Annual income (e.g., 110 for $110k): ")?;

    console.say("\nEducation level:")?;
    console.say("  1 = Undergraduate")?;
    console.say("  2 = Graduate")?;
    console.say("  3 = Advanced/Professional")?;
    let education = console.ask_int_in("Choose 1/2/3: ", &[1, 2, 3])?;

    console.say("\nFamily size:")?;
    console.say("  1, 2, 3, or 4")?;
    let family_size = console.ask_int_in("Choose 1/2/3/4: ", &[1, 2, 3, 4])?;

    let cd_account = console
        .ask_yes_no("\nDo you have a Certificate of Deposit (CD) account? (Y/N): ")?;

    Ok(ApplicantAnswers {
        income,
        education,
        family_size,
        cd_account,
    })
}

fn render_response<W: Write>(out: &mut W, response: &PredictResponse, tier: Tier) -> io::Result<()> {
    let result = &response.result;
    writeln!(out, "\nPrediction probability: {:.4}", result.probability)?;
    writeln!(out, "Standard decision: {}", result.decision_standard)?;
    writeln!(out, "High recall decision: {}", result.decision_high_recall)?;
    writeln!(out, "VIP promo decision: {}", result.decision_vip_promo)?;
    writeln!(
        out,
        "Thresholds used: standard {}, high_recall {}, vip_promo {}",
        result.thresholds.standard, result.thresholds.high_recall, result.thresholds.vip_promo
    )?;

    match result.thresholds.cutoff(tier) {
        Some(cutoff) => writeln!(out, "Offer: {} (p >= {cutoff})", tier.label()),
        None => writeln!(out, "Offer: {} (below all thresholds)", tier.label()),
    }
}
