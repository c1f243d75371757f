//! Demo Scoring Client
//!
//! Scores the reference applicant and a batch of random applicants against a
//! running scoring service, printing the verdict for each.

use credit_scoring_service::client::{risk_warning, ClientRecord, Codebook, ScoringClient};
use credit_scoring_service::config::AppConfig;
use credit_scoring_service::types::ClientFeatures;
use futures::future::join_all;
use rand::Rng;
use tracing::{error, info, warn};

/// Random applicant generator for testing
struct ApplicantGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ApplicantGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate an applicant with a good credit history
    fn generate_regular(&mut self) -> ClientFeatures {
        ClientFeatures {
            gender: self.rng.gen_range(0..=1),
            married: self.rng.gen_range(0..=1),
            dependents: self.rng.gen_range(0..=3),
            education: i64::from(self.rng.gen_bool(0.2)),
            self_employed: i64::from(self.rng.gen_bool(0.15)),
            applicant_income: self.rng.gen_range(2000.0..12000.0_f64).round(),
            coapplicant_income: if self.rng.gen_bool(0.5) {
                self.rng.gen_range(500.0..4000.0_f64).round()
            } else {
                0.0
            },
            loan_amount: self.rng.gen_range(60.0..250.0_f64).round(),
            loan_amount_term: *self.random_choice(&[180.0, 360.0, 360.0, 480.0]),
            credit_history: 1.0,
            property_area: self.rng.gen_range(0..=2),
        }
    }

    /// Generate an applicant with a bad credit history and a large loan
    fn generate_risky(&mut self) -> ClientFeatures {
        ClientFeatures {
            credit_history: 0.0,
            coapplicant_income: 0.0,
            applicant_income: self.rng.gen_range(1000.0..6000.0_f64).round(),
            loan_amount: self.rng.gen_range(100.0..500.0_f64).round(),
            ..self.generate_regular()
        }
    }

    fn random_choice<'a, T>(&mut self, choices: &'a [T]) -> &'a T {
        &choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Applicant used throughout the service's regression tests, as a dashboard
/// operator would enter it
fn reference_record() -> serde_json::Result<ClientRecord> {
    serde_json::from_value(serde_json::json!({
        "Gender": "Homme",
        "Married": "Marié(e)",
        "Dependents": 0,
        "Education": "Supérieur",
        "Self_Employed": "Non",
        "ApplicantIncome": 5000,
        "CoapplicantIncome": 0,
        "LoanAmount": 120,
        "Loan_Amount_Term": 360,
        "Credit_History": "Bon",
        "Property_Area": "Urbaine"
    }))
}

/// Record view of an applicant, for label display
fn to_record(features: &ClientFeatures) -> ClientRecord {
    match serde_json::to_value(features) {
        Ok(serde_json::Value::Object(map)) => ClientRecord(map),
        _ => ClientRecord::default(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("score_client=info".parse()?),
        )
        .init();

    info!("Starting Demo Scoring Client");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Configuration not found, using defaults");
        AppConfig::default()
    });

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    if let Some(url) = args.get(1) {
        config.client.base_url = url.clone();
    }
    let count: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
    let risky_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.3);

    let policy = config.decision;
    let client = ScoringClient::from_config(&config.client)?;

    info!(
        base_url = %client.base_url(),
        count = count,
        risky_rate = risky_rate,
        "Configuration loaded"
    );

    match client.health().await {
        Ok(message) => info!(message = %message, "Scoring service is up"),
        Err(e) => {
            error!(error = %e, "Scoring service unavailable");
            return Ok(());
        }
    }

    let codebook = Codebook::new();

    match client.predict_record(&reference_record()?, &codebook).await {
        Ok(prediction) => info!(
            status = %prediction.status,
            default_probability = prediction.default_probability,
            "Reference applicant: {}",
            policy.evaluate(prediction.default_probability)
        ),
        Err(e) => error!(error = %e, "Reference applicant failed"),
    }

    let mut generator = ApplicantGenerator::new();
    let mut rng = rand::thread_rng();

    let mut applicants = Vec::with_capacity(count);
    for _ in 0..count {
        if rng.gen_bool(risky_rate) {
            applicants.push(generator.generate_risky());
        } else {
            applicants.push(generator.generate_regular());
        }
    }

    let responses = join_all(applicants.iter().map(|a| client.predict(a))).await;

    let mut approved = 0;
    for (i, (applicant, response)) in applicants.iter().zip(responses).enumerate() {
        match response {
            Ok(prediction) => {
                let approval = policy.evaluate(prediction.default_probability);
                if approval.approved {
                    approved += 1;
                }
                let record = to_record(applicant);
                info!(
                    applicant = i,
                    gender = %record.display_value(&codebook, "Gender"),
                    property_area = %record.display_value(&codebook, "Property_Area"),
                    credit_history = %record.display_value(&codebook, "Credit_History"),
                    status = %prediction.status,
                    default_probability = prediction.default_probability,
                    "{}",
                    approval
                );
                if let Some(warning) = risk_warning(applicant, &approval) {
                    warn!(applicant = i, "{}", warning);
                }
            }
            Err(e) => error!(applicant = i, error = %e, "Prediction failed"),
        }
    }

    info!(
        "Completed! Scored {} applicants ({} approved at {:.0}% threshold)",
        applicants.len(),
        approved,
        policy.approval_threshold * 100.0
    );

    Ok(())
}
