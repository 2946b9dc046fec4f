//! Small operations client for the cursus JSON API.
//!
//! Covers the day-to-day admin actions: enroll a learner, replay a
//! completion event, inspect progress, and fetch or lazily issue a
//! certificate.

mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use client::{ApiClient, ApiConfig};

#[derive(Parser)]
#[command(author, version, about = "cursus enrollment admin client")]
struct Cli {
  /// Base URL of a running cursus API server.
  #[arg(long, default_value = "http://127.0.0.1:8080")]
  base_url: String,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Enroll a learner in a course.
  Enroll {
    learner_id: Uuid,
    course_id:  Uuid,
  },
  /// Record that a lesson finished playing.
  Complete {
    learner_id: Uuid,
    course_id:  Uuid,
    lesson_id:  String,
  },
  /// Show one enrollment, or all of a learner's enrollments.
  Status {
    learner_id: Uuid,
    course_id:  Option<Uuid>,
  },
  /// Fetch the certificate for a pair; `--issue` generates it on first
  /// view if the course is completed.
  Certificate {
    learner_id: Uuid,
    course_id:  Uuid,
    #[arg(long)]
    issue: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let client = ApiClient::new(ApiConfig { base_url: cli.base_url })?;

  match cli.command {
    Command::Enroll { learner_id, course_id } => {
      let enrollment = client.enroll(learner_id, course_id).await?;
      print_json(&enrollment)?;
    }
    Command::Complete { learner_id, course_id, lesson_id } => {
      let outcome = client
        .complete_lesson(learner_id, course_id, &lesson_id)
        .await?;
      print_json(&outcome)?;
    }
    Command::Status { learner_id, course_id: Some(course_id) } => {
      let enrollment = client.enrollment(learner_id, course_id).await?;
      print_json(&enrollment)?;
    }
    Command::Status { learner_id, course_id: None } => {
      let enrollments = client.enrollments_for_learner(learner_id).await?;
      print_json(&enrollments)?;
    }
    Command::Certificate { learner_id, course_id, issue } => {
      let certificate = if issue {
        client.issue_certificate(learner_id, course_id).await?
      } else {
        client.certificate(learner_id, course_id).await?
      };
      print_json(&certificate)?;
    }
  }

  Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
