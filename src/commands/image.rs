// ABOUTME: Image commands: list, info, pull, push, delete, and build.
// ABOUTME: Thin wrappers over the Image handle.

use super::connect;
use crate::cli::{ImageCommand, ImageTarget};
use dockside::error::Result;
use dockside::output::{Output, OutputMode};
use dockside::runtime::ImageError;

pub async fn images(output: &Output) -> Result<()> {
    let api = connect()?;
    if output.mode() == OutputMode::Normal {
        for name in api.images_names().await? {
            output.text(&name);
        }
        return Ok(());
    }
    output.data(&api.images().await?)
}

pub async fn image_command(command: ImageCommand, output: &mut Output) -> Result<()> {
    let api = connect()?;

    match command {
        ImageCommand::Info(ImageTarget { name, tag }) => {
            let image = api.image(&name, tag.as_deref().unwrap_or(""))?;
            match image.info().await? {
                Some(record) => output.data(&record),
                None => Err(ImageError::NotFound(image.name_with_tag()).into()),
            }
        }
        ImageCommand::Pull(ImageTarget { name, tag }) => {
            let image = api.image(&name, tag.as_deref().unwrap_or(""))?;
            output.start_timer();
            output.progress(&format!("Pulling {}...", image.name_with_tag()));
            if !image.pull().await? {
                return Err(ImageError::PullFailed(image.name_with_tag()).into());
            }
            output.success(&format!("Pulled {}", image.name_with_tag()));
            Ok(())
        }
        ImageCommand::Push(ImageTarget { name, tag }) => {
            let image = api.image(&name, tag.as_deref().unwrap_or(""))?;
            output.start_timer();
            output.progress(&format!("Pushing {}...", image.name_with_tag()));
            image.push().await?;
            output.success(&format!("Pushed {}", image.name_with_tag()));
            Ok(())
        }
        ImageCommand::Delete(ImageTarget { name, tag }) => {
            let image = api.image(&name, tag.as_deref().unwrap_or(""))?;
            if !image.delete().await? {
                return Err(ImageError::NotFound(image.name_with_tag()).into());
            }
            output.success(&format!("Deleted {}", image.name_with_tag()));
            Ok(())
        }
        ImageCommand::Build {
            target: ImageTarget { name, tag },
            path,
        } => {
            let image = api.image(&name, tag.as_deref().unwrap_or(""))?;
            output.start_timer();
            output.progress(&format!(
                "Building {} from {}...",
                image.name_with_tag(),
                path.display()
            ));

            let outcome = image.build(&path).await?;
            if output.mode() != OutputMode::Normal {
                return output.data(&outcome);
            }

            for line in outcome.logs.iter().filter_map(|log| log.stream.as_deref()) {
                output.progress(line.trim_end());
            }
            output.success(&format!(
                "Built {} ({})",
                outcome.tags.join(", "),
                outcome.image.short_id
            ));
            Ok(())
        }
    }
}
