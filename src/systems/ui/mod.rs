use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};

use crate::config::CONFIG_FILE;
use crate::systems::arena::generator::GenerationState;
use crate::systems::arena::host::HostRegistry;
use crate::systems::arena::layout::solver::GeometryFit;
use crate::systems::arena::model::GeometryValidation;
use crate::systems::arena::{ArenaConfig, BakeEvent, RegenerateEvent, WipeEvent};
use crate::systems::export::ExportEvent;
use crate::systems::gizmos::GizmoSettings;

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app.add_systems(EguiPrimaryContextPass, (ui_main, fps));
    }
}

#[allow(clippy::too_many_arguments)]
fn ui_main(
    mut contexts: EguiContexts,
    mut config: ResMut<ArenaConfig>,
    state: Res<GenerationState>,
    registry: Res<HostRegistry>,
    mut gizmo_settings: ResMut<GizmoSettings>,
    mut regen_events: EventWriter<RegenerateEvent>,
    mut wipe_events: EventWriter<WipeEvent>,
    mut bake_events: EventWriter<BakeEvent>,
    mut export_events: EventWriter<ExportEvent>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::SidePanel::left("config_panel")
        .default_width(200.0)
        .min_width(250.0)
        .max_width(400.0)
        .resizable(true)
        .show(ctx, |ui| {
            let mut regenerate = false;

            // camera
            ui.label("Camera: ");
            ui.label("WASD - Move");
            ui.label("Scroll - Zoom");
            ui.label("MMB - Rotate");

            ui.separator();

            ui.label("Overlays:");
            ui.checkbox(&mut gizmo_settings.grid_enabled, "Ground grid");
            ui.checkbox(&mut gizmo_settings.outlines_enabled, "Section outlines")
                .on_hover_text("Derived polygon and grid of every section, red when they do not fit");

            ui.separator();

            egui::CollapsingHeader::new("Seed")
                .default_open(true)
                .show(ui, |ui| {
                ui.label(format!("Current: {}", config.settings.seed));
                ui.horizontal(|ui| {
                    if ui.button("Regenerate").on_hover_text("Rebuild with the current seed").clicked() {
                        regenerate = true;
                    }
                    if ui.button("New seed").on_hover_text("R").clicked() {
                        regen_events.write(RegenerateEvent { seed: Some(rand::random()) });
                    }
                });
            });

            egui::CollapsingHeader::new("Settings")
                .default_open(true)
                .show(ui, |ui| {
                let settings = &mut config.settings;
                regenerate |= ui.add(egui::Slider::new(&mut settings.max_sides, 3..=crate::config::MAX_SIDES)
                    .text("Max Sides"))
                    .changed();
                regenerate |= ui.add(egui::Slider::new(&mut settings.max_tiles_per_side_row, 1..=crate::config::MAX_TILES_PER_SIDE_ROW)
                    .text("Max Tiles / Side"))
                    .changed();

                ui.horizontal(|ui| {
                    ui.label("Validation:");
                    for (mode, label) in [
                        (GeometryValidation::Off, "Off"),
                        (GeometryValidation::Warn, "Warn"),
                        (GeometryValidation::Clamp, "Clamp"),
                    ] {
                        regenerate |= ui.selectable_value(&mut settings.geometry_validation, mode, label).changed();
                    }
                });
            });

            // per section targets, edits rebuild immediately
            for (index, section) in config.sections.iter_mut().enumerate() {
                egui::CollapsingHeader::new(format!("Section {index} ({:?})", section.build_order_rule))
                    .default_open(index == 0)
                    .show(ui, |ui| {
                    let targets = &mut section.targets;
                    regenerate |= ui.add(egui::Slider::new(&mut targets.polygon_sides, 3..=crate::config::MAX_SIDES)
                        .text("Sides"))
                        .changed();
                    if section.build_order_rule.is_grid_led() {
                        regenerate |= ui.add(egui::Slider::new(&mut targets.grid_dimensions, 1..=60)
                            .text("Grid Dimensions"))
                            .changed();
                    } else {
                        regenerate |= ui.add(egui::Slider::new(&mut targets.tiles_per_side, 1..=30)
                            .text("Tiles / Side"))
                            .changed();
                    }
                    regenerate |= ui.add(egui::Slider::new(&mut targets.radius, 100.0..=20000.0)
                        .text("Radius"))
                        .on_hover_text("Only read by the radius build orders")
                        .changed();

                    // derived values of the last build
                    if let Some(summary) = state.sections.get(index) {
                        let g = &summary.geometry;
                        ui.add_space(4.0);
                        egui::Grid::new(format!("geometry_{index}")).show(ui, |ui| {
                            ui.label("Side length");
                            ui.label(format!("{:.1}", g.side_length));
                            ui.end_row();
                            ui.label("Radius / apothem");
                            ui.label(format!("{:.1} / {:.1}", g.inscribed_radius, g.apothem));
                            ui.end_row();
                            ui.label("Angles");
                            ui.label(format!("{:.2}° / {:.2}°", g.interior_angle, g.exterior_angle));
                            ui.end_row();
                            ui.label("Tiles / side");
                            ui.label(g.tiles_per_side.to_string());
                            ui.end_row();
                            ui.label("Grid");
                            ui.label(format!("{0} x {0}", g.grid_dimensions));
                            ui.end_row();
                        });

                        let (status_text, status_color) = match summary.fit {
                            GeometryFit::Fits => ("Fits", egui::Color32::from_rgb(34, 139, 34)),
                            GeometryFit::Overflows => ("Overflows grid", egui::Color32::from_rgb(178, 34, 34)),
                            GeometryFit::Gapped => ("Gapped sides", egui::Color32::from_rgb(178, 34, 34)),
                        };
                        ui.label(egui::RichText::new(status_text).color(status_color));
                    }
                });
            }

            ui.separator();

            egui::Grid::new("counts").show(ui, |ui| {
                ui.label("Instances");
                ui.label(registry.instance_total().to_string());
                ui.end_row();
                ui.label("Actors");
                ui.label(registry.live_actors().count().to_string());
                ui.end_row();
                ui.label("Groups used");
                ui.label(state.used_group_ids().map(|id| id.to_string()).collect::<Vec<_>>().join(", "));
                ui.end_row();
            });

            ui.separator();

            ui.horizontal(|ui| {
                let wipe_button = egui::Button::new("Wipe").fill(egui::Color32::from_rgb(130, 22, 22));
                if ui.add(wipe_button).on_hover_text("C").clicked() {
                    wipe_events.write(WipeEvent);
                }
                if ui.button("Bake")
                    .on_hover_text("Replace instances with standalone actors")
                    .clicked() {
                    bake_events.write(BakeEvent);
                }
            });

            ui.horizontal(|ui| {
                if ui.button("Export layout")
                    .on_hover_text("Write every placement to a text file, current directory")
                    .clicked() {
                    let filename = format!("arena_{}.txt", config.settings.seed);
                    export_events.write(ExportEvent { filename });
                }
                if ui.button("Save config")
                    .on_hover_text(CONFIG_FILE)
                    .clicked() {
                    match config.save(CONFIG_FILE) {
                        Ok(()) => info!("saved arena config to {CONFIG_FILE}"),
                        Err(err) => error!("{err}"),
                    }
                }
            });

            ui.separator();
            ui.label("ESC - Exit");

            if regenerate {
                regen_events.write(RegenerateEvent { seed: None });
            }
        });
}

fn fps(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("fps_counter"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps) = diagnostics
                        .get(&FrameTimeDiagnosticsPlugin::FPS)
                        .and_then(|d| d.smoothed())
                    {
                        ui.label(egui::RichText::new(format!("{:.0}", fps))
                            .size(26.0)
                            .color(egui::Color32::WHITE));
                    }
                });
            });
    }
}
