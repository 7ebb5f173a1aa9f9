use crate::{
    cli::{FineTuneCommand, DEFAULT_FILE_PURPOSE},
    commands::files,
    config::Config,
    errors::GptError,
    openai::{FineTuningJob, OpenAi},
    output::{self, print_separator, separator_line},
    validation,
};

pub fn fine_tune(command: FineTuneCommand, config: &Config) -> Result<(), GptError> {
    // Check flags before requiring credentials
    if let FineTuneCommand::CreateJob { file_id, model } = &command {
        validate_job(file_id.as_deref(), model.as_deref())?;
    }
    let limit = match &command {
        FineTuneCommand::ListJobs { limit, .. } => Some(validation::limit(limit.as_deref())?),
        _ => None,
    };

    let api = OpenAi::new(config)?;

    match command {
        FineTuneCommand::UploadFile { file } => files::upload(&api, &file, DEFAULT_FILE_PURPOSE),
        FineTuneCommand::CreateJob { file_id, model } => create_job(
            &api,
            file_id.as_deref().unwrap_or_default(),
            model.as_deref().unwrap_or_default(),
        ),
        FineTuneCommand::DeleteModel { model_id } => delete_model(&api, &model_id),
        FineTuneCommand::ListJobs { json, .. } => {
            list_jobs(&api, json, limit.unwrap_or(validation::DEFAULT_LIMIT))
        }
    }
}

fn validate_job(file_id: Option<&str>, model: Option<&str>) -> Result<(), GptError> {
    if file_id.map_or(true, str::is_empty) {
        return Err(GptError::validation("No training file ID provided"));
    }
    if model.map_or(true, str::is_empty) {
        return Err(GptError::validation("No model provided"));
    }
    Ok(())
}

fn create_job(api: &OpenAi, file_id: &str, model: &str) -> Result<(), GptError> {
    print_separator();
    println!("Training using file with ID: {}", file_id);
    println!("Training model: {}", model);
    print_separator();

    let id = api.create_fine_tuning_job(model, file_id)?;
    println!("Deployed fine tuning job with ID: {}", id);
    Ok(())
}

fn delete_model(api: &OpenAi, model_id: &str) -> Result<(), GptError> {
    if api.delete_model(model_id)? {
        println!("Success!\nDeleted model with ID: {}", model_id);
    } else {
        println!("Warning!\nDid not delete model with ID: {}", model_id);
    }
    Ok(())
}

fn list_jobs(api: &OpenAi, json: bool, limit: i64) -> Result<(), GptError> {
    let jobs = api.list_fine_tuning_jobs(limit)?;
    if json {
        println!("{}", jobs.raw);
        return Ok(());
    }

    let mut jobs = jobs.value.data;
    jobs.sort_by_key(|job| job.created_at);
    print!("{}", jobs_table(&jobs));
    Ok(())
}

fn optional_datetime(timestamp: Option<i64>) -> String {
    timestamp.map_or_else(|| "-".to_string(), output::datetime)
}

fn jobs_table(jobs: &[FineTuningJob]) -> String {
    let sep = separator_line();
    let mut table = format!(
        "{sep}\n{:<40}{:<30}{:<30}{}\n{sep}\n",
        "Job ID", "Created at", "Estimated finish", "Finished at"
    );
    for job in jobs {
        table.push_str(&format!(
            "{:<40}{:<30}{:<30}{}\n",
            job.id,
            output::datetime(job.created_at),
            optional_datetime(job.estimated_finish),
            optional_datetime(job.finished_at)
        ));
    }
    table.push_str(&sep);
    table.push('\n');
    table
}
