use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use logbook_core::models::UserId;
use logbook_db::LogbookStore;

#[derive(Debug, Subcommand)]
pub enum AssignCommand {
    /// Let a faculty member review every student of a batch
    Batch(AssignBatchArgs),

    /// Let a faculty member review one student
    Student(AssignStudentArgs),
}

#[derive(Debug, Args)]
pub struct AssignBatchArgs {
    /// Faculty user id (identity provider id)
    #[arg(long)]
    pub faculty: String,

    #[arg(long)]
    pub batch: Uuid,
}

#[derive(Debug, Args)]
pub struct AssignStudentArgs {
    #[arg(long)]
    pub faculty: String,

    #[arg(long)]
    pub student: String,
}

pub async fn execute(store: &dyn LogbookStore, command: AssignCommand) -> Result<()> {
    let faculty = match command {
        AssignCommand::Batch(args) => {
            let faculty = UserId::new(args.faculty);
            store.assign_batch(&faculty, args.batch).await?;
            tracing::info!(faculty = %faculty, batch_id = %args.batch, "batch assigned");
            println!("✅ {} now reviews batch {}", faculty, args.batch);
            faculty
        }
        AssignCommand::Student(args) => {
            let faculty = UserId::new(args.faculty);
            store.assign_student(&faculty, &UserId::new(args.student.as_str())).await?;
            tracing::info!(faculty = %faculty, student = %args.student, "student assigned");
            println!("✅ {} now reviews student {}", faculty, args.student);
            faculty
        }
    };

    let students = store.assigned_students(&faculty).await?;
    println!("   Students in scope: {}", students.len());
    Ok(())
}
