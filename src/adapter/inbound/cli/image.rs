//! Handler for `image register`.

use serde_json::json;

use crate::adapter::inbound::cli::command::ImageRegisterArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::{CorrelationId, Image, ImageReference};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Insert an image record into the configured store.
pub async fn register(args: &ImageRegisterArgs) -> Result<()> {
    let config = Config::load(&args.config.config)?;
    let reference = ImageReference::parse(&args.link)?;

    let image = Image {
        cor_id: args
            .cor_id
            .clone()
            .map_or_else(CorrelationId::generate, CorrelationId::new),
        creator_name: args.creator.clone(),
        image_name: args.name.clone(),
        image_tag: args.tag.clone(),
        image_registry_link: args.link.clone(),
    };

    let store = bootstrap::build_store(&config.store)?;
    store.insert_image(&image).await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "image.register",
            "image": image,
        }));
        return Ok(());
    }

    output::success("Image registered");
    output::field("Key", image.key());
    output::field("Cor id", &image.cor_id);
    output::field("Repository", &reference.repository);
    output::field("Tag", &reference.tag);
    Ok(())
}
