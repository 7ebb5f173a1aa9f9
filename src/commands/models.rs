use crate::{
    cli::ModelsArgs,
    config::Config,
    errors::GptError,
    openai::{Model, OpenAi},
    output,
};

pub fn models(args: &ModelsArgs, config: &Config) -> Result<(), GptError> {
    let models = OpenAi::new(config)?.list_models()?;
    if args.json {
        println!("{}", models.raw);
        return Ok(());
    }

    let mut models = select_models(models.value.data, args.user);
    models.sort_by_key(|model| model.created);
    print!("{}", models_table(&models));
    Ok(())
}

/// OpenAI's models, or the user's own with `user`
fn select_models(models: Vec<Model>, user: bool) -> Vec<Model> {
    models
        .into_iter()
        .filter(|model| model.owned_by_openai() != user)
        .collect()
}

fn models_table(models: &[Model]) -> String {
    let mut table = format!("Number of models: {}\n\n", models.len());
    table.push_str(&format!(
        "{:<25}{:<35}{}\n",
        "Creation time", "Owner", "Model ID"
    ));
    for model in models {
        table.push_str(&format!(
            "{:<25}{:<35}{}\n",
            output::datetime(model.created),
            model.owned_by,
            model.id
        ));
    }
    table
}
