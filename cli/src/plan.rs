use crate::compose::build_editor;
use crate::SceneArgs;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub scene: SceneArgs,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let settings = args.scene.settings()?;
    let editor = build_editor(settings, &args.scene)?;

    let page = editor.plan()?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
