//! Clip evaluation.
//!
//! Evaluation is a pure function of stored curve data and the query time.
//! Results are written into the animated structures, after which every node
//! transform is recomputed from the root down.

mod curve;

use gex_ddl::NodeId;
use gex_math::Mat4;

use crate::structures::{animation_time_range, texcoord_transform, update_node_transforms, GexDescription, GexKind};

/// Document time for a query time in seconds.
fn document_time(description: &GexDescription, time: f32) -> f32 {
    let scale = description.grammar().metrics.time_scale;
    if scale != 0.0 {
        time / scale
    } else {
        time
    }
}

/// Animations tagged with `clip`, in document order.
fn clip_animations(description: &GexDescription, clip: u32) -> Vec<NodeId> {
    description
        .grammar()
        .animations
        .iter()
        .copied()
        .filter(|&id| matches!(description.kind(id), Some(GexKind::Animation(a)) if a.clip == clip))
        .collect()
}

/// Time window of a clip in seconds, `(0, 0)` when no animation uses it.
pub(crate) fn time_range(description: &GexDescription, clip: u32) -> (f32, f32) {
    let range = clip_animations(description, clip)
        .into_iter()
        .filter_map(|id| animation_time_range(description, id))
        .reduce(|(min0, max0), (min1, max1)| (min0.min(min1), max0.max(max1)));

    match range {
        Some((min, max)) => {
            let scale = description.grammar().metrics.time_scale;
            (min * scale, max * scale)
        }
        None => (0.0, 0.0),
    }
}

/// Sample one track at document time `time` and write its target.
fn evaluate_track(description: &mut GexDescription, track: NodeId, time: f32) {
    let Some(GexKind::Track(t)) = description.kind(track) else {
        return;
    };
    let (Some(target), Some(time_curve), Some(value_curve)) = (t.target, t.time, t.value) else {
        return;
    };

    let (index, u) = match description.kind(time_curve) {
        Some(GexKind::Time(c)) => c.interpolation_parameter(time),
        _ => return,
    };
    let values = match description.kind(value_curve) {
        Some(GexKind::Value(c)) => c.sample(index, u),
        _ => return,
    };

    let angle_scale = description.grammar().metrics.angle_scale;
    if let Some(kind) = description.kind_mut(target) {
        kind.animate(&values, angle_scale);
    }
}

/// Update every animation of `clip` to `time` seconds.
pub(crate) fn evaluate(description: &mut GexDescription, clip: u32, time: f32) {
    let time = document_time(description, time);

    for animation in clip_animations(description, clip) {
        let Some(GexKind::Animation(a)) = description.kind(animation) else {
            continue;
        };
        let mut local = time;
        if let Some(begin) = a.begin {
            local = local.max(begin);
        }
        if let Some(end) = a.end {
            local = local.min(end);
        }

        for track in a.tracks.clone() {
            evaluate_track(description, track, local);
        }

        // Animated texture coordinates live on the texture itself.
        if let Some(parent) = description.parent(animation) {
            if matches!(description.kind(parent), Some(GexKind::Texture(_))) {
                let transform = texcoord_transform(description, parent);
                if let Some(GexKind::Texture(texture)) = description.kind_mut(parent) {
                    texture.texcoord_transform = transform;
                }
            }
        }
    }

    update_all_node_transforms(description);
}

/// Recompute every node transform from the root down.
pub(crate) fn update_all_node_transforms(description: &mut GexDescription) {
    let root = description.root();
    let top: Vec<NodeId> = description
        .custom_children(root)
        .filter(|(_, kind)| kind.is_node())
        .map(|(id, _)| id)
        .collect();
    for node in top {
        update_node_transforms(description, node, Mat4::IDENTITY);
    }
}
