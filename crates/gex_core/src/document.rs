//! Loaded scene documents.
//!
//! [`GexDocument`] owns the processed structure tree and exposes the
//! queries an importer needs: node hierarchy, cached transforms, units and
//! clip evaluation.

use std::path::Path;

use gex_ddl::{NodeId, StructureRef};
use gex_math::Mat4;

use crate::animation;
use crate::error::{LoadError, LoadResult};
use crate::grammar::OpenGex;
use crate::metrics::Metrics;
use crate::options::LoadOptions;
use crate::structures::{GexDescription, GexKind, GexStructure, Node, NodeTransforms};

/// A fully processed scene document.
#[derive(Debug)]
pub struct GexDocument {
    description: GexDescription,
}

impl GexDocument {
    /// Parse a document with default options.
    pub fn parse(text: &str) -> LoadResult<Self> {
        Self::parse_with_options(text, LoadOptions::default())
    }

    pub fn parse_with_options(text: &str, options: LoadOptions) -> LoadResult<Self> {
        let description = GexDescription::parse(OpenGex::new(options), text)?;
        Ok(Self { description })
    }

    /// Load a document from disk with default options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use gex_core::GexDocument;
    ///
    /// let document = GexDocument::load("scene.ogex")?;
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        Self::load_with_options(path, LoadOptions::default())
    }

    pub fn load_with_options<P: AsRef<Path>>(path: P, options: LoadOptions) -> LoadResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let description = GexDescription::parse_bytes(OpenGex::new(options), &bytes)?;
        let document = Self { description };
        log::info!(
            "Loaded {}: {} nodes, {} animations",
            path.display(),
            document.nodes().len(),
            document.animations().len()
        );
        Ok(document)
    }

    /// Underlying structure tree.
    pub fn description(&self) -> &GexDescription {
        &self.description
    }

    pub fn root(&self) -> NodeId {
        self.description.root()
    }

    pub fn structure(&self, id: NodeId) -> &GexStructure {
        self.description.structure(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&GexKind> {
        self.description.kind(id)
    }

    /// Recognized children of `id` in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &GexKind)> + '_ {
        self.description.custom_children(id)
    }

    /// Resolve a reference from the top level.
    pub fn find(&self, reference: &StructureRef) -> Option<NodeId> {
        self.description.find_structure(reference, self.root())
    }

    /// Structure registered under `$name`.
    pub fn global(&self, name: &str) -> Option<NodeId> {
        self.description.global(name)
    }

    pub fn options(&self) -> &LoadOptions {
        self.description.grammar().options()
    }

    pub fn metrics(&self) -> &Metrics {
        self.description.grammar().metrics()
    }

    /// Every node structure in document order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.description
            .tree()
            .descendants(self.root())
            .filter(|&id| self.kind(id).is_some_and(GexKind::is_node))
            .collect()
    }

    /// Top-level nodes.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.children(self.root())
            .filter(|(_, kind)| kind.is_node())
            .map(|(id, _)| id)
            .collect()
    }

    /// Top-level geometry, light and camera objects.
    pub fn objects(&self) -> Vec<NodeId> {
        self.children(self.root())
            .filter(|(_, kind)| kind.is_object())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn materials(&self) -> Vec<NodeId> {
        self.children(self.root())
            .filter(|(_, kind)| matches!(kind, GexKind::Material(_)))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn animations(&self) -> &[NodeId] {
        self.description.grammar().animations()
    }

    pub fn clips(&self) -> &[NodeId] {
        self.description.grammar().clips()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.kind(id).and_then(GexKind::node)
    }

    /// Name from a node's `Name` child.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| n.name.as_deref())
    }

    pub fn node_transforms(&self, id: NodeId) -> Option<&NodeTransforms> {
        self.node(id).map(|n| &n.transforms)
    }

    /// Node transform relative to its parent node.
    pub fn node_transform(&self, id: NodeId) -> Option<Mat4> {
        self.node_transforms(id).map(|t| t.node)
    }

    /// Node transform composed with every ancestor's.
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        self.node_transforms(id).map(|t| t.world)
    }

    /// Time window of `clip` in seconds.
    pub fn time_range(&self, clip: u32) -> (f32, f32) {
        animation::time_range(&self.description, clip)
    }

    /// Move every animation of `clip` to `time` seconds and refresh the
    /// cached node transforms.
    pub fn evaluate(&mut self, clip: u32, time: f32) {
        animation::evaluate(&mut self.description, clip, time);
    }
}

impl TryFrom<&str> for GexDocument {
    type Error = LoadError;

    fn try_from(text: &str) -> LoadResult<Self> {
        Self::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GexError;
    use crate::options::UpAxis;
    use crate::structures::{GeometryNode, Mesh, Skin};
    use gex_ddl::{DataError, DescriptionError, StructureError};
    use gex_math::Vec3;

    const TRIANGLE: &str = r#"
GeometryObject $geom
{
    Mesh (primitive = "triangles")
    {
        VertexArray (attrib = "position")
        {
            float[3] {{0, 0, 0}, {1, 0, 0}, {0, 1, 0}}
        }
        IndexArray
        {
            unsigned_int32[3] {{0, 1, 2}}
        }
    }
}
"#;

    fn parse(text: &str) -> GexDocument {
        let _ = env_logger::builder().is_test(true).try_init();
        GexDocument::parse(text).unwrap()
    }

    fn process_error(text: &str) -> GexError {
        GexDocument::parse(text).unwrap_err().gex_error().unwrap()
    }

    fn translation(m: Mat4) -> Vec3 {
        m.w_axis.truncate()
    }

    #[test]
    fn test_distance_metric_is_exact() {
        let document = parse(r#"Metric (key = "distance") {float {0.01}}"#);
        assert_eq!(document.metrics().distance_scale, 0.01);
    }

    #[test]
    fn test_metric_errors() {
        assert_eq!(
            process_error(r#"Metric (key = "up") {string {"x"}}"#),
            GexError::InvalidUpDirection
        );
        assert_eq!(
            process_error(r#"Metric (key = "distance") {float {1, 2}}"#),
            GexError::Structure(StructureError::InvalidDataFormat)
        );
    }

    #[test]
    fn test_node_composition() {
        let text = format!(
            r#"
Node $parent
{{
    Name {{string {{"parent"}}}}
    Translation {{float[3] {{{{1, 2, 3}}}}}}

    GeometryNode $child
    {{
        Name {{string {{"child"}}}}
        ObjectRef {{ref {{$geom}}}}
        Translation {{float[3] {{{{1, 0, 0}}}}}}
    }}
}}
{TRIANGLE}"#
        );
        let document = parse(&text);

        let parent = document.global("parent").unwrap();
        let child = document.global("child").unwrap();
        assert_eq!(document.nodes(), vec![parent, child]);
        assert_eq!(document.root_nodes(), vec![parent]);
        assert_eq!(document.name_of(child), Some("child"));

        let world = document.world_transform(child).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::new(2.0, 2.0, 3.0), 1e-6));
        let local = document.node_transform(child).unwrap();
        assert!(translation(local).abs_diff_eq(Vec3::X, 1e-6));

        match document.kind(child) {
            Some(GexKind::GeometryNode(GeometryNode { object, .. })) => {
                assert_eq!(*object, document.global("geom"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_object_flag_transforms_are_separate() {
        let text = format!(
            r#"
GeometryNode $node
{{
    ObjectRef {{ref {{$geom}}}}
    Translation {{float[3] {{{{1, 0, 0}}}}}}
    Scale (object = true) {{float[3] {{{{2, 2, 2}}}}}}
}}
{TRIANGLE}"#
        );
        let document = parse(&text);
        let transforms = document.node_transforms(document.global("node").unwrap()).unwrap();
        assert!(translation(transforms.node).abs_diff_eq(Vec3::X, 1e-6));
        assert!(transforms
            .object
            .abs_diff_eq(Mat4::from_scale(Vec3::splat(2.0)), 1e-6));
        assert!((transforms.object * transforms.inverse_object).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_y_up_document_converts_to_z_up() {
        let text = r#"
Metric (key = "up") {string {"y"}}
Metric (key = "distance") {float {2}}
Node $n
{
    Translation {float[3] {{0, 1, 0}}}
}
"#;
        let document = parse(text);
        assert_eq!(document.metrics().up, UpAxis::Y);

        let world = document.world_transform(document.global("n").unwrap()).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));

        let options = LoadOptions {
            target_up: UpAxis::Y,
            apply_distance_scale: false,
            ..Default::default()
        };
        let document = GexDocument::parse_with_options(text, options).unwrap();
        let world = document.world_transform(document.global("n").unwrap()).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_extraneous_object_ref() {
        let text = format!(
            r#"
GeometryNode
{{
    ObjectRef {{ref {{$geom}}}}
    ObjectRef {{ref {{$geom}}}}
}}
{TRIANGLE}"#
        );
        assert_eq!(
            process_error(&text),
            GexError::Structure(StructureError::ExtraneousSubstructure)
        );
    }

    #[test]
    fn test_object_ref_to_wrong_kind() {
        let text = r#"
Material $mat {}
LightNode
{
    ObjectRef {ref {$mat}}
}
"#;
        assert_eq!(process_error(text), GexError::InvalidObjectRef);
    }

    #[test]
    fn test_broken_reference_reports_line() {
        let text = "GeometryNode\n{\n    ObjectRef {ref {$missing}}\n}\n";
        let err = GexDocument::parse(text).unwrap_err();
        assert_eq!(err.gex_error(), Some(GexError::Structure(StructureError::BrokenRef)));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_transform_array_size_errors() {
        let under = format!("Node {{Transform {{float[16] {{{{{}}}}}}}}}", vec!["0"; 15].join(", "));
        match GexDocument::parse(&under).unwrap_err() {
            LoadError::Parse(DescriptionError::Syntax { kind, .. }) => {
                assert_eq!(kind, DataError::PrimitiveArrayUnderSize)
            }
            other => panic!("unexpected error {:?}", other),
        }

        let over = format!("Node {{Transform {{float[16] {{{{{}}}}}}}}}", vec!["0"; 17].join(", "));
        match GexDocument::parse(&over).unwrap_err() {
            LoadError::Parse(DescriptionError::Syntax { kind, .. }) => {
                assert_eq!(kind, DataError::PrimitiveArrayOverSize)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_illegal_top_level_structure() {
        match GexDocument::parse("VertexArray {float[3] {{0, 0, 0}}}").unwrap_err() {
            LoadError::Parse(DescriptionError::Syntax { kind, .. }) => {
                assert_eq!(kind, DataError::InvalidStructure)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_structures_are_ignored() {
        let document = parse("Extension {float {1}}\nNode $n {}");
        assert_eq!(document.nodes().len(), 1);
    }

    const ANIMATED: &str = r#"
Metric (key = "time") {float {1}}
Node $n
{
    Translation %xform {float[3] {{0, 0, 0}}}

    Animation
    {
        Track (target = %xform)
        {
            Time {Key {float {0, 2}}}
            Value {Key {float[3] {{0, 0, 0}, {2, 0, 0}}}}
        }
    }
}
"#;

    #[test]
    fn test_clip_time_range() {
        let document = parse(ANIMATED);
        assert_eq!(document.animations().len(), 1);
        assert_eq!(document.time_range(0), (0.0, 2.0));
        assert_eq!(document.time_range(1), (0.0, 0.0));
    }

    #[test]
    fn test_evaluate_updates_world_transforms() {
        let mut document = parse(ANIMATED);
        let node = document.global("n").unwrap();

        document.evaluate(0, 1.0);
        let world = document.world_transform(node).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::X, 1e-6));

        // Past the last key the value holds.
        document.evaluate(0, 5.0);
        let world = document.world_transform(node).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_key_count_mismatch() {
        let text = r#"
Node
{
    Translation %xform {float[3] {{0, 0, 0}}}
    Animation
    {
        Track (target = %xform)
        {
            Time {Key {float {0, 1, 2}}}
            Value {Key {float[3] {{0, 0, 0}, {1, 0, 0}, {2, 0, 0}, {3, 0, 0}}}}
        }
    }
}
"#;
        assert_eq!(process_error(text), GexError::KeyCountMismatch);
    }

    #[test]
    fn test_track_target_must_be_local() {
        let text = r#"
Node
{
    Translation $xform {float[3] {{0, 0, 0}}}
    Animation
    {
        Track (target = $xform)
        {
            Time {Key {float {0, 1}}}
            Value {Key {float[3] {{0, 0, 0}, {1, 0, 0}}}}
        }
    }
}
"#;
        assert_eq!(process_error(text), GexError::TargetRefNotLocal);
    }

    const CURVE_TRACK: &str = r#"
Node $n
{
    Translation %xform {float[3] {{0, 0, 0}}}
    Animation
    {
        Track (target = %xform)
        {
            TIME
            VALUE
        }
    }
}
"#;

    const LINEAR_TIME: &str = "Time {Key {float {0, 3}}}";
    const LINEAR_VALUE: &str = "Value {Key {float[3] {{0, 0, 0}, {4, 0, 0}}}}";

    const BEZIER_TIME: &str = r#"Time (curve = "bezier")
            {
                Key {float {0, 3}}
                Key (kind = "-control") {float {-1, 2}}
                Key (kind = "+control") {float {1, 4}}
            }"#;

    const TCB_VALUE: &str = r#"Value (curve = "tcb")
            {
                Key {float[3] {{0, 0, 0}, {4, 0, 0}}}
                Key (kind = "tension") {float {0, 0}}
                Key (kind = "continuity") {float {0, 0}}
                Key (kind = "bias") {float {0, 0}}
            }"#;

    fn curve_track(time: &str, value: &str) -> String {
        CURVE_TRACK.replace("TIME", time).replace("VALUE", value)
    }

    #[test]
    fn test_bezier_time_with_tcb_value() {
        let mut document = parse(&curve_track(BEZIER_TIME, TCB_VALUE));
        let node = document.global("n").unwrap();
        assert_eq!(document.time_range(0), (0.0, 3.0));

        document.evaluate(0, 1.5);
        let world = document.world_transform(node).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));

        document.evaluate(0, 3.0);
        let world = document.world_transform(node).unwrap();
        assert!(translation(world).abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_key_kind_must_match_curve() {
        let linear_with_tension = TCB_VALUE.replace("tcb", "linear");
        assert_eq!(
            process_error(&curve_track(LINEAR_TIME, &linear_with_tension)),
            GexError::InvalidKeyKind
        );

        let unknown_kind = r#"Value {Key (kind = "weight") {float[3] {{0, 0, 0}, {4, 0, 0}}}}"#;
        assert_eq!(
            process_error(&curve_track(LINEAR_TIME, unknown_kind)),
            GexError::InvalidKeyKind
        );
    }

    #[test]
    fn test_invalid_curve_types() {
        let unknown_curve = r#"Value (curve = "spline") {Key {float[3] {{0, 0, 0}, {4, 0, 0}}}}"#;
        assert_eq!(
            process_error(&curve_track(LINEAR_TIME, unknown_curve)),
            GexError::InvalidCurveType
        );

        // Time curves are linear or bezier only.
        let tcb_time = r#"Time (curve = "tcb")
            {
                Key {float {0, 3}}
                Key (kind = "tension") {float {0, 0}}
                Key (kind = "continuity") {float {0, 0}}
                Key (kind = "bias") {float {0, 0}}
            }"#;
        assert_eq!(
            process_error(&curve_track(tcb_time, LINEAR_VALUE)),
            GexError::InvalidCurveType
        );
    }

    #[test]
    fn test_key_structure_errors() {
        assert_eq!(
            process_error(&curve_track("Time {Key {float {}}}", LINEAR_VALUE)),
            GexError::EmptyKeyStructure
        );
        assert_eq!(
            process_error(&curve_track(
                "Time {Key {float {0, 3}} Key {float {0, 3}}}",
                LINEAR_VALUE
            )),
            GexError::Structure(StructureError::ExtraneousSubstructure)
        );

        // Tension, continuity and bias are scalar keys.
        let sized_tension = r#"Value (curve = "tcb")
            {
                Key {float[3] {{0, 0, 0}, {4, 0, 0}}}
                Key (kind = "tension") {float[2] {{0, 0}}}
                Key (kind = "continuity") {float {0, 0}}
                Key (kind = "bias") {float {0, 0}}
            }"#;
        assert_eq!(
            process_error(&curve_track(LINEAR_TIME, sized_tension)),
            GexError::Structure(StructureError::InvalidDataFormat)
        );
    }

    #[test]
    fn test_material_refs() {
        let node = |refs: &str| {
            format!(
                r#"
Material $m0 {{Color (attrib = "diffuse") {{float[3] {{{{1, 0, 0}}}}}}}}
Material $m1 {{}}
Material $m2 {{}}
GeometryNode $node
{{
    ObjectRef {{ref {{$geom}}}}
    {refs}
}}
{TRIANGLE}"#
            )
        };

        let document = parse(&node(
            "MaterialRef (index = 1) {ref {$m1}}\n    MaterialRef {ref {$m0}}",
        ));
        let m0 = document.global("m0").unwrap();
        let m1 = document.global("m1").unwrap();
        match document.kind(document.global("node").unwrap()) {
            Some(GexKind::GeometryNode(g)) => assert_eq!(g.materials, vec![m0, m1]),
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(document.materials().len(), 3);
        match document.kind(m0) {
            Some(GexKind::Material(m)) => {
                assert_eq!(m.attributes.color("diffuse"), Some(gex_math::Vec4::new(1.0, 0.0, 0.0, 1.0)));
            }
            other => panic!("unexpected kind {:?}", other),
        }

        let gap = node("MaterialRef (index = 0) {ref {$m0}}\n    MaterialRef (index = 2) {ref {$m2}}");
        assert_eq!(process_error(&gap), GexError::MissingMaterialRef);

        let duplicate = node("MaterialRef {ref {$m0}}\n    MaterialRef {ref {$m1}}");
        assert_eq!(process_error(&duplicate), GexError::DuplicateMaterialRef);
    }

    const SKINNED: &str = r#"
BoneNode $b0 {}
BoneNode $b1 {}

GeometryObject $geom
{
    Mesh
    {
        VertexArray (attrib = "position")
        {
            float[3] {{0, 0, 0}, {1, 0, 0}, {0, 1, 0}}
        }
        IndexArray
        {
            unsigned_int32[3] {{0, 1, 2}}
        }
        Skin
        {
            Skeleton
            {
                BoneRefArray {ref {$b0, $b1}}
                Transform
                {
                    float[16]
                    {
                        {1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1},
                        {1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1}
                    }
                }
            }
            BoneCountArray {unsigned_int16 {1, 1, 2}}
            BoneIndexArray {unsigned_int16 {0, 1, 0, BONE}}
            BoneWeightArray {float {1, 1, 0.5, 0.5}}
        }
    }
}
"#;

    #[test]
    fn test_skinned_mesh() {
        let document = parse(&SKINNED.replace("BONE", "1"));
        let geom = document.global("geom").unwrap();
        let (_, mesh) = document.children(geom).next().unwrap();
        let GexKind::Mesh(Mesh { skin: Some(skin), vertex_count, .. }) = mesh else {
            panic!("mesh has no skin");
        };
        assert_eq!(*vertex_count, 3);
        match document.kind(*skin) {
            Some(GexKind::Skin(Skin { bone_counts, bone_weights, .. })) => {
                assert_eq!(bone_counts, &vec![1, 1, 2]);
                assert_eq!(bone_weights.len(), 4);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_skin_bone_index_out_of_range() {
        assert_eq!(process_error(&SKINNED.replace("BONE", "2")), GexError::InvalidBoneRef);
    }

    #[test]
    fn test_mesh_requires_position() {
        let text = r#"
GeometryObject
{
    Mesh
    {
        VertexArray (attrib = "normal") {float[3] {{0, 0, 1}}}
    }
}
"#;
        assert_eq!(process_error(text), GexError::PositionArrayRequired);
    }

    #[test]
    fn test_light_and_camera_objects() {
        let text = r#"
Metric (key = "distance") {float {0.01}}
LightObject $light (type = "spot", shadow = false)
{
    Color (attrib = "light") {float[3] {{1, 1, 1}}}
    Atten (kind = "distance", curve = "inverse")
    {
        Param (attrib = "scale") {float {100}}
    }
}
CameraObject $camera
{
    Param (attrib = "fovy") {float {1}}
    Param (attrib = "near") {float {10}}
    Param (attrib = "far") {float {-5}}
}
"#;
        let document = parse(text);

        let Some(GexKind::LightObject(light)) = document.kind(document.global("light").unwrap()) else {
            panic!("not a light");
        };
        assert_eq!(light.light_type, crate::structures::LightType::Spot);
        assert!(!light.shadow);
        assert_eq!(light.attenuations.len(), 1);
        match document.kind(light.attenuations[0]) {
            Some(GexKind::Atten(atten)) => {
                assert_eq!(atten.curve, crate::structures::AttenCurve::Inverse);
                assert_eq!(atten.linear, 1.0);
                assert!((atten.scale - 1.0).abs() < 1e-6);
                assert_eq!(atten.end, 1.0);
            }
            other => panic!("unexpected kind {:?}", other),
        }

        let Some(GexKind::CameraObject(camera)) = document.kind(document.global("camera").unwrap()) else {
            panic!("not a camera");
        };
        assert_eq!(camera.fov, Some(1.0));
        assert!((camera.projection_distance - 1.0 / 0.5f32.tan()).abs() < 1e-6);
        assert!((camera.near_depth - 0.1).abs() < 1e-6);
        assert_eq!(camera.far_depth, 1000.0);
    }

    #[test]
    fn test_light_type_is_required() {
        assert_eq!(process_error("LightObject {}"), GexError::UndefinedLightType);
        assert_eq!(
            process_error(r#"LightObject (type = "point") {Atten (curve = "cubic") {}}"#),
            GexError::UndefinedCurve
        );
    }

    #[test]
    fn test_parse_through_try_from() {
        let document = GexDocument::try_from(TRIANGLE).unwrap();
        assert_eq!(document.objects().len(), 1);
        assert!(document.nodes().is_empty());
    }
}
