use fusionsync_core::lambda;
use fusionsync_core::ResourceKind;

use crate::cli::LambdaCommands;
use crate::commands::common::{connect, resource_dir};
use crate::error::CliError;
use crate::output::{print_lines, Line, Tone};

pub async fn run_lambda(command: LambdaCommands, profile: Option<&str>) -> Result<(), CliError> {
    match command {
        LambdaCommands::Create { id, input, remote } => {
            let client = connect(remote, profile)?;
            let dir = resource_dir(input, ResourceKind::Lambda);
            lambda::create_lambda(&client, &dir, &id).await?;
            success(format!("Created lambda {id}"));
        }
        LambdaCommands::Update { id, input, remote } => {
            let client = connect(remote, profile)?;
            let dir = resource_dir(input, ResourceKind::Lambda);
            lambda::update_lambda(&client, &dir, &id).await?;
            success(format!("Updated lambda {id}"));
        }
        LambdaCommands::Retrieve { id, output, remote } => {
            let client = connect(remote, profile)?;
            let yaml = lambda::retrieve_lambda(&client, &id, output.as_deref()).await?;
            print!("{yaml}");
            if let Some(dir) = output {
                success(format!(
                    "Saved lambda {id} to {}",
                    lambda::lambda_path(&dir, &id).display()
                ));
            }
        }
        LambdaCommands::LinkToApplication {
            application_id,
            lambda_id,
            remote,
        } => {
            let client = connect(remote, profile)?;
            lambda::link_to_application(&client, &application_id, &lambda_id).await?;
            success(format!(
                "Linked lambda {lambda_id} to application {application_id}"
            ));
        }
        LambdaCommands::UnlinkFromApplication {
            application_id,
            lambda_id,
            remote,
        } => {
            let client = connect(remote, profile)?;
            if !lambda::unlink_from_application(&client, &application_id, &lambda_id).await? {
                return Err(CliError::NoLinkedLambdas);
            }
            success(format!(
                "Unlinked lambda {lambda_id} from application {application_id}"
            ));
        }
    }
    Ok(())
}

fn success(text: String) {
    print_lines(&[Line::new(Tone::Success, text)]);
}
