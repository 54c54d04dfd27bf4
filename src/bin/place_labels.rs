use clap::Parser;
use object_label_placement::config::LabelMode;
use object_label_placement::io::{LabelOverlay, load_scene, object_to_json};
use object_label_placement::positioner::{
    ObjectLabelPositioner, PlacementInputs, StyleProps, default_object_label,
};
use object_label_placement::visualization::log_placements;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about)]
struct PlaceLabelsCli {
    /// path to scene json
    scene: PathBuf,

    /// write the label report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// which objects get a label
    #[arg(long, value_enum, default_value = "selected")]
    label_mode: LabelMode,

    /// save placements to a rerun recording
    #[arg(long)]
    rerun_output: Option<PathBuf>,
}

fn render_label(mode: LabelMode) -> impl Fn(&StyleProps) -> Option<String> {
    move |props: &StyleProps| match mode {
        LabelMode::Selected => default_object_label(props),
        LabelMode::All => Some(format!("ID: {}", props.id)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = PlaceLabelsCli::parse();

    let scene = load_scene(&cli.scene)?;
    let recording = match &cli.rerun_output {
        Some(path) => Some(rerun::RecordingStreamBuilder::new("object_labels").save(path)?),
        None => None,
    };

    let now = Instant::now();
    let mut positioner = ObjectLabelPositioner::new();
    let mut overlays = Vec::with_capacity(scene.frames.len());
    for (frame_idx, frame) in scene.frames.iter().enumerate() {
        let inputs = PlacementInputs {
            frame: Some(frame),
            metadata: &scene.metadata,
            object_selection: &scene.selection,
            xviz_style_parser: &scene.styles,
            transform_override: None,
        };
        let records = positioner.place_all(&inputs, Some(render_label(cli.label_mode)));
        if let Some(recording) = &recording {
            log_placements(recording, "/scene", frame_idx as i64, &records)?;
        }
        overlays.push(LabelOverlay::new(
            frame,
            scene.viewport.as_ref(),
            &scene.popup,
            &records,
        ));
    }
    log::info!(
        "placed labels for {} frames in {:.6} sec, {} transforms derived",
        overlays.len(),
        now.elapsed().as_secs_f64(),
        positioner.cache().derivations()
    );

    match &cli.output {
        Some(path) => object_to_json(path, &overlays)?,
        None => println!("{}", serde_json::to_string_pretty(&overlays)?),
    }
    Ok(())
}
