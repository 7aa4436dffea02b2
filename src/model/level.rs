// Static layout of the three rooms and the per-frame draw list.
//
// Rooms run along -Z: room one spans z in [-2.5, 2.5], room two [-7.5, -2.5]
// and room three [-12.5, -7.5]. Every placement is translate * rotate * scale.

use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use super::puzzle::{Lever, PuzzleState};

/// Shader-visible object ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ObjectId {
    Sphere = 0,
    Wall = 2,
    Floor = 6,
    Floor2 = 11,
    Floor3 = 16,
    Door1 = 17,
    Door2 = 18,
    Map = 19,
    Lever1 = 20,
    Lever2 = 21,
    Lever3 = 22,
    Lever4 = 23,
    Lever5 = 24,
    Lever6 = 25,
    Lever7 = 26,
    WoodTable = 27,
    WoodChair = 28,
    WoodZ1 = 29,
    WoodZ2 = 30,
    WoodZ3 = 31,
    TipBoard1 = 32,
    TipBoard2 = 33,
    Oscar = 34,
    Spider1 = 35,
    Spider2 = 36,
    Trophy = 37,
    Roof1 = 38,
    Roof2 = 39,
    Roof3 = 40,
    TipSphere = 41,
}

/// Texture images in bind order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    EarthDay,
    EarthNight,
    Wall,
    Floor,
    OakWood,
    Tip1,
    Tip2,
    Gold,
    Silver,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 9] = [
        TextureSlot::EarthDay,
        TextureSlot::EarthNight,
        TextureSlot::Wall,
        TextureSlot::Floor,
        TextureSlot::OakWood,
        TextureSlot::Tip1,
        TextureSlot::Tip2,
        TextureSlot::Gold,
        TextureSlot::Silver,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TextureSlot::EarthDay => "tc-earth_daymap_surface.jpg",
            TextureSlot::EarthNight => "tc-earth_nightmap_citylights.gif",
            TextureSlot::Wall => "wall.jpg",
            TextureSlot::Floor => "floor.jpg",
            TextureSlot::OakWood => "oak-wood.png",
            TextureSlot::Tip1 => "tip1.png",
            TextureSlot::Tip2 => "tip2.png",
            TextureSlot::Gold => "goldTexture.jpg",
            TextureSlot::Silver => "silverTexture.jpg",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// How the fragment shader derives texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum UvMapping {
    /// Coordinates from the mesh file.
    Mesh = 0,
    /// Projection onto the bounding box XY face.
    Planar = 1,
    /// Longitude/latitude around the bounding box centre.
    Spherical = 2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub primary: TextureSlot,
    /// Blended in on the unlit side (globe night lights).
    pub secondary: Option<TextureSlot>,
    pub mapping: UvMapping,
    pub tint: [f32; 4],
}

impl Material {
    const fn textured(primary: TextureSlot, mapping: UvMapping) -> Self {
        Self { primary, secondary: None, mapping, tint: [1.0; 4] }
    }
}

impl ObjectId {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn lever(lever: Lever) -> Self {
        match lever {
            Lever::L1 => ObjectId::Lever1,
            Lever::L2 => ObjectId::Lever2,
            Lever::L3 => ObjectId::Lever3,
            Lever::L4 => ObjectId::Lever4,
            Lever::L5 => ObjectId::Lever5,
            Lever::L6 => ObjectId::Lever6,
            Lever::L7 => ObjectId::Lever7,
        }
    }

    pub fn material(self) -> Material {
        use ObjectId::*;
        match self {
            Sphere => Material {
                primary: TextureSlot::EarthDay,
                secondary: Some(TextureSlot::EarthNight),
                mapping: UvMapping::Spherical,
                tint: [1.0; 4],
            },
            Wall | Roof1 | Roof2 | Roof3 => Material::textured(TextureSlot::Wall, UvMapping::Mesh),
            Floor | Floor2 | Floor3 => Material::textured(TextureSlot::Floor, UvMapping::Mesh),
            Door1 | Door2 | WoodTable | WoodChair | WoodZ1 | WoodZ2 | WoodZ3 => {
                Material::textured(TextureSlot::OakWood, UvMapping::Planar)
            }
            Map => Material {
                tint: [0.85, 0.8, 0.7, 1.0],
                ..Material::textured(TextureSlot::Wall, UvMapping::Mesh)
            },
            Lever1 | Lever2 | Lever3 | Lever4 | Lever5 | Lever6 | Lever7 => {
                Material::textured(TextureSlot::Silver, UvMapping::Planar)
            }
            TipBoard1 => Material::textured(TextureSlot::Tip1, UvMapping::Mesh),
            TipBoard2 => Material::textured(TextureSlot::Tip2, UvMapping::Mesh),
            Spider1 | Spider2 => Material {
                tint: [0.35, 0.35, 0.35, 1.0],
                ..Material::textured(TextureSlot::Silver, UvMapping::Planar)
            },
            Oscar | Trophy | TipSphere => Material::textured(TextureSlot::Gold, UvMapping::Spherical),
        }
    }
}

/// Meshes the layout draws; start-up fails if any is missing.
pub const REQUIRED_MESHES: [&str; 10] = [
    "sphere",
    "plane",
    "door",
    "lever",
    "woodChair",
    "woodTable",
    "woodZ",
    "oscar",
    "spider",
    "trophy",
];

/// Mesh files loaded at start-up, in load order.
pub const MESH_FILES: [&str; 11] = [
    "sphere.obj",
    "plane.obj",
    "wall.obj",
    "spider.obj",
    "door.obj",
    "lever.obj",
    "woodChair.obj",
    "woodTable.obj",
    "woodZ.obj",
    "oscar.obj",
    "trophy.obj",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub mesh: &'static str,
    pub model: Mat4,
    pub object: ObjectId,
}

/// Frame inputs the layout depends on.
pub struct SceneSnapshot<'a> {
    pub puzzle: &'a PuzzleState,
    /// Seconds since start-up.
    pub elapsed: f32,
    pub globe_spin_rate: f32,
    pub euler_y: f32,
    pub hint_position: Vec3,
    pub show_hint: bool,
}

fn trs(t: Vec3, rotation: Mat4, s: Vec3) -> Mat4 {
    Mat4::from_translation(t) * rotation * Mat4::from_scale(s)
}

fn rx(a: f32) -> Mat4 {
    Mat4::from_rotation_x(a)
}

fn ry(a: f32) -> Mat4 {
    Mat4::from_rotation_y(a)
}

fn rz(a: f32) -> Mat4 {
    Mat4::from_rotation_z(a)
}

const WALL_SCALE: Vec3 = Vec3::new(2.5, 2.5, 2.3);
const SHORT_WALL_SCALE: Vec3 = Vec3::new(2.0, 2.5, 2.3);
const FLOOR_SCALE: Vec3 = Vec3::new(2.5, 1.0, 2.5);
const LEVER_SCALE: Vec3 = Vec3::splat(0.075);
const DOOR_SCALE: Vec3 = Vec3::new(0.2, 0.7, 0.15);

/// Lever mount points on the west wall of room one.
const LEVER_MOUNTS: [(Lever, Vec3); 7] = [
    (Lever::L1, Vec3::new(-2.4, 1.9, 1.3)),
    (Lever::L2, Vec3::new(-2.4, 1.0, -1.7)),
    (Lever::L3, Vec3::new(-2.4, 1.95, -1.0)),
    (Lever::L4, Vec3::new(-2.4, 1.5, -0.95)),
    (Lever::L5, Vec3::new(-2.4, 1.2, 0.55)),
    (Lever::L6, Vec3::new(-2.4, 1.5, -0.5)),
    (Lever::L7, Vec3::new(-2.4, 1.8, -0.2)),
];

fn walls(out: &mut Vec<DrawCommand>) {
    let east = rx(-FRAC_PI_2) * rz(FRAC_PI_2);
    let west = rx(-FRAC_PI_2) * rz(-FRAC_PI_2);
    let facing_north = rx(-FRAC_PI_2);
    let facing_south = rx(-FRAC_PI_2) * rz(PI);

    let placements = [
        (Vec3::new(2.5, 1.3, 0.0), east, WALL_SCALE),
        (Vec3::new(-2.5, 1.3, 0.0), west, WALL_SCALE),
        (Vec3::new(0.0, 1.3, 2.5), facing_north, WALL_SCALE),
        (Vec3::new(-1.0, 1.3, -2.5), facing_south, SHORT_WALL_SCALE),
        (Vec3::new(2.5, 1.3, -5.0), east, WALL_SCALE),
        (Vec3::new(-2.5, 1.3, -5.0), west, WALL_SCALE),
        (Vec3::new(-1.0, 1.3, -2.5), facing_north, SHORT_WALL_SCALE),
        (Vec3::new(1.35, 1.3, -7.5), facing_south, SHORT_WALL_SCALE),
        (Vec3::new(2.5, 1.3, -10.0), east, WALL_SCALE),
        (Vec3::new(-2.5, 1.3, -10.0), west, WALL_SCALE),
        (Vec3::new(1.35, 1.3, -7.5), facing_north, SHORT_WALL_SCALE),
        (Vec3::new(0.0, 1.3, -12.5), facing_south, WALL_SCALE),
    ];
    for (t, r, s) in placements {
        out.push(DrawCommand { mesh: "plane", model: trs(t, r, s), object: ObjectId::Wall });
    }
}

fn floors_and_roofs(out: &mut Vec<DrawCommand>) {
    let rooms = [
        (0.0, ObjectId::Floor, ObjectId::Roof1),
        (-5.0, ObjectId::Floor2, ObjectId::Roof2),
        (-10.0, ObjectId::Floor3, ObjectId::Roof3),
    ];
    for (z, floor, roof) in rooms {
        out.push(DrawCommand {
            mesh: "plane",
            model: Mat4::from_translation(Vec3::new(0.0, 0.0, z)) * Mat4::from_scale(FLOOR_SCALE),
            object: floor,
        });
        // scale applies before the flip
        out.push(DrawCommand {
            mesh: "plane",
            model: Mat4::from_translation(Vec3::new(0.0, 3.6, z)) * Mat4::from_scale(FLOOR_SCALE) * rz(PI),
            object: roof,
        });
    }
}

fn doors(puzzle: &PuzzleState, out: &mut Vec<DrawCommand>) {
    let doors = [
        (Vec3::new(1.85, 1.0, -2.5), ObjectId::Door1, puzzle.door1_open()),
        (Vec3::new(-1.5, 1.0, -7.5), ObjectId::Door2, puzzle.door2_open()),
    ];
    for (t, object, open) in doors {
        if !open {
            out.push(DrawCommand { mesh: "door", model: trs(t, ry(-FRAC_PI_2), DOOR_SCALE), object });
        }
    }
}

fn room_one(snapshot: &SceneSnapshot, out: &mut Vec<DrawCommand>) {
    let spin = snapshot.euler_y + snapshot.elapsed * snapshot.globe_spin_rate;
    out.push(DrawCommand {
        mesh: "sphere",
        model: trs(Vec3::new(0.0, 0.9, -2.0), rz(0.6) * rx(0.2) * ry(spin), Vec3::splat(0.3)),
        object: ObjectId::Sphere,
    });
    if snapshot.show_hint {
        out.push(DrawCommand {
            mesh: "sphere",
            model: Mat4::from_translation(snapshot.hint_position) * Mat4::from_scale(Vec3::splat(0.1)),
            object: ObjectId::TipSphere,
        });
    }
    out.push(DrawCommand {
        mesh: "plane",
        model: trs(
            Vec3::new(-2.4, 1.3, 0.0),
            rx(-FRAC_PI_2) * rz(-FRAC_PI_2) * ry(PI),
            Vec3::new(2.2, 1.0, 1.0),
        ),
        object: ObjectId::Map,
    });
    for (lever, t) in LEVER_MOUNTS {
        let mut model = trs(t, rz(-FRAC_PI_2), LEVER_SCALE);
        if snapshot.puzzle.levers().is_active(lever) {
            model *= ry(PI);
        }
        out.push(DrawCommand { mesh: "lever", model, object: ObjectId::lever(lever) });
    }
    out.push(DrawCommand {
        mesh: "plane",
        model: trs(Vec3::new(0.0, 1.3, 2.49), rx(FRAC_PI_2) * rz(PI), Vec3::ONE),
        object: ObjectId::TipBoard1,
    });
    // globe stand
    out.push(DrawCommand {
        mesh: "woodTable",
        model: Mat4::from_translation(Vec3::new(0.0, 0.2, -2.4)) * Mat4::from_scale(Vec3::splat(0.1)) * ry(FRAC_PI_2),
        object: ObjectId::WoodTable,
    });
}

fn room_two(snapshot: &SceneSnapshot, out: &mut Vec<DrawCommand>) {
    let rot = snapshot.puzzle.rotations();
    out.push(DrawCommand {
        mesh: "woodTable",
        model: Mat4::from_translation(Vec3::new(-1.0, 0.3, -4.0)) * Mat4::from_scale(Vec3::splat(0.175)) * ry(FRAC_PI_2),
        object: ObjectId::WoodTable,
    });
    out.push(DrawCommand {
        mesh: "woodChair",
        model: Mat4::from_translation(Vec3::new(-1.0, 0.0, -4.0))
            * Mat4::from_scale(Vec3::splat(0.135))
            * ry(rot.chair as f32 * -FRAC_PI_2),
        object: ObjectId::WoodChair,
    });
    let props = [
        (Vec3::new(-2.4, 1.8, -5.2), rot.z1, ObjectId::WoodZ1),
        (Vec3::new(-2.4, 1.5, -5.4), rot.z2, ObjectId::WoodZ2),
        (Vec3::new(-2.4, 1.8, -5.6), rot.z3, ObjectId::WoodZ3),
    ];
    for (t, steps, object) in props {
        out.push(DrawCommand {
            mesh: "woodZ",
            model: Mat4::from_translation(t) * rx(steps as f32 * PI / 5.0),
            object,
        });
    }
    out.push(DrawCommand {
        mesh: "plane",
        model: trs(
            Vec3::new(2.49, 1.3, -5.0),
            rx(-FRAC_PI_2) * rz(FRAC_PI_2) * ry(PI),
            Vec3::new(1.5, 0.75, 0.75),
        ),
        object: ObjectId::TipBoard2,
    });
}

fn room_three(out: &mut Vec<DrawCommand>) {
    out.push(DrawCommand {
        mesh: "oscar",
        model: Mat4::from_translation(Vec3::new(0.0, 0.0, -12.0)) * Mat4::from_scale(Vec3::splat(2.5)),
        object: ObjectId::Oscar,
    });
    let spiders = [(1.0, -PI / 5.0, ObjectId::Spider1), (-1.0, PI / 5.0, ObjectId::Spider2)];
    for (x, yaw, object) in spiders {
        out.push(DrawCommand {
            mesh: "spider",
            model: Mat4::from_translation(Vec3::new(x, 0.0, -11.5)) * Mat4::from_scale(Vec3::splat(0.5)) * ry(yaw),
            object,
        });
    }
    out.push(DrawCommand {
        mesh: "trophy",
        model: Mat4::from_translation(Vec3::new(0.0, 0.0, -11.0)) * Mat4::from_scale(Vec3::splat(0.25)) * ry(FRAC_PI_2),
        object: ObjectId::Trophy,
    });
}

/// Everything to draw this frame, in draw order.
pub fn draw_list(snapshot: &SceneSnapshot) -> Vec<DrawCommand> {
    let mut out = Vec::with_capacity(48);
    room_one(snapshot, &mut out);
    walls(&mut out);
    floors_and_roofs(&mut out);
    doors(snapshot.puzzle, &mut out);
    room_two(snapshot, &mut out);
    room_three(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(puzzle: &PuzzleState, show_hint: bool) -> SceneSnapshot<'_> {
        SceneSnapshot {
            puzzle,
            elapsed: 0.0,
            globe_spin_rate: 0.1,
            euler_y: 0.0,
            hint_position: Vec3::new(-2.39, 1.0, -1.7),
            show_hint,
        }
    }

    fn count(list: &[DrawCommand], object: ObjectId) -> usize {
        list.iter().filter(|c| c.object == object).count()
    }

    #[test]
    fn test_closed_doors_are_drawn() {
        let puzzle = PuzzleState::new();
        let list = draw_list(&snapshot(&puzzle, false));
        assert_eq!(count(&list, ObjectId::Door1), 1);
        assert_eq!(count(&list, ObjectId::Door2), 1);
        assert_eq!(count(&list, ObjectId::Wall), 12);
    }

    #[test]
    fn test_open_door_is_hidden() {
        let mut puzzle = PuzzleState::new();
        for lever in [Lever::L2, Lever::L4, Lever::L5] {
            puzzle.toggle_pressed(lever);
        }
        puzzle.commit();
        let list = draw_list(&snapshot(&puzzle, false));
        assert_eq!(count(&list, ObjectId::Door1), 0);
        assert_eq!(count(&list, ObjectId::Door2), 1);
    }

    #[test]
    fn test_hint_marker_only_when_requested() {
        let puzzle = PuzzleState::new();
        assert_eq!(count(&draw_list(&snapshot(&puzzle, false)), ObjectId::TipSphere), 0);
        let list = draw_list(&snapshot(&puzzle, true));
        let marker = list.iter().find(|c| c.object == ObjectId::TipSphere).map(|c| c.model);
        let origin = marker.map(|m| m.transform_point3(Vec3::ZERO));
        assert_eq!(origin, Some(Vec3::new(-2.39, 1.0, -1.7)));
    }

    #[test]
    fn test_active_lever_is_flipped() {
        let mut puzzle = PuzzleState::new();
        let before = draw_list(&snapshot(&puzzle, false));
        puzzle.toggle_pressed(Lever::L3);
        let after = draw_list(&snapshot(&puzzle, false));
        let model = |list: &[DrawCommand], id| list.iter().find(|c| c.object == id).map(|c| c.model);
        assert_ne!(model(&before, ObjectId::Lever3), model(&after, ObjectId::Lever3));
        assert_eq!(model(&before, ObjectId::Lever1), model(&after, ObjectId::Lever1));
    }

    #[test]
    fn test_draw_list_only_uses_required_meshes() {
        let puzzle = PuzzleState::new();
        for cmd in draw_list(&snapshot(&puzzle, true)) {
            assert!(REQUIRED_MESHES.contains(&cmd.mesh), "{} not required", cmd.mesh);
        }
    }

    #[test]
    fn test_every_placed_object_has_material_texture() {
        let puzzle = PuzzleState::new();
        for cmd in draw_list(&snapshot(&puzzle, true)) {
            let mat = cmd.object.material();
            assert!(mat.primary.index() < TextureSlot::ALL.len());
        }
    }

    #[test]
    fn test_texture_slots_in_load_order() {
        assert_eq!(TextureSlot::ALL[0].file_name(), "tc-earth_daymap_surface.jpg");
        assert_eq!(TextureSlot::ALL[8].file_name(), "silverTexture.jpg");
        for (i, slot) in TextureSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }
}
