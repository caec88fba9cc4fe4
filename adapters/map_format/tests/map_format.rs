use openbound_core::{
    Aabb, ExplosionRecord, ObstacleAction, ObstacleId, Placement, Vec2, PLAYER_RADIUS,
    UNIT_RADIUS_EPS,
};
use openbound_map_format::{parse_map, MapFormatError, TileTable};
use serde_json::{json, Value};

const HALF_WIDTH: f32 = PLAYER_RADIUS - UNIT_RADIUS_EPS;

fn document() -> Value {
    json!({
        "map_name":   "pillar room",
        "map_author": "tester",
        "map_notes":  "two obstacles",
        "difficulty": 3,
        "map_width":  8,
        "map_height": 6,
        "init_lives": 2,
        "start_pos":  [24, 24],
        "tile_dat":   [[0,0,0,0,0,0,0,0],
                       [1,0,0,0,0,0,0,1],
                       [1,0,0,0,3,0,0,1],
                       [1,4,4,4,4,4,4,1],
                       [1,0,0,0,0,0,0,1],
                       [1,1,1,1,1,1,1,1]],
        "obstacle_10": {
            "startbox": [16, 64, 48, 80],
            "endbox":   [96, 64, 112, 80],
            "revive":   [24, 72],
            "actions":  [],
            "loc_10":   [32, 64, 48, 80],
            "loc_9":    [16, 64, 32, 80],
            "exp_1":    [["10", "9"], ["zergling", "zergling"], 2]
        },
        "obstacle_2": {
            "startbox": [16, 16, 48, 48],
            "endbox":   [80, 16, 112, 48],
            "revive":   [24, 40],
            "actions":  [["move_player", 0], ["set_lives", 3], ["change_music", "ambush"]],
            "loc_1":    [32, 32, 48, 48],
            "loc_2":    [64, 64, 80, 80],
            "exp_2":    [["2"], ["zergling"], 0],
            "exp_1":    [["1", "2"], ["crystal", "scourge"], 4]
        }
    })
}

fn parse(document: &Value) -> Result<openbound_map_format::LoadedMap, MapFormatError> {
    parse_map(&document.to_string(), &TileTable::default(), HALF_WIDTH)
}

#[test]
fn metadata_and_grid_are_read() {
    let map = parse(&document()).expect("valid map");
    assert_eq!(map.name, "pillar room");
    assert_eq!(map.author, "tester");
    assert_eq!(map.difficulty, 3);

    let definition = &map.definition;
    assert_eq!(definition.start, Vec2::new(24.0, 24.0));
    assert_eq!(definition.initial_lives, 2);
    assert_eq!(definition.grid.columns(), 8);
    assert_eq!(definition.grid.rows(), 6);
    // The open top row is sealed by border sanitization.
    assert!(definition.grid.is_wall_at(3, 0));
    assert!(definition.grid.is_wall_at(4, 2));
    assert!(!definition.grid.is_wall_at(2, 2));
    assert!(!definition.grid.is_wall_at(3, 3));
}

#[test]
fn obstacles_follow_numeric_key_order() {
    let map = parse(&document()).expect("valid map");
    let obstacles = &map.definition.obstacles;
    assert_eq!(obstacles.len(), 2);
    assert_eq!(obstacles[0].id, ObstacleId::new(0));
    assert_eq!(obstacles[0].revive, Vec2::new(24.0, 40.0));
    assert_eq!(obstacles[1].id, ObstacleId::new(1));
    assert_eq!(obstacles[1].revive, Vec2::new(24.0, 72.0));

    let names: Vec<&str> = obstacles[1]
        .locations
        .iter()
        .map(|location| location.name.as_str())
        .collect();
    assert_eq!(names, vec!["9", "10"]);
}

#[test]
fn obstacle_contents_are_converted() {
    let map = parse(&document()).expect("valid map");
    let gate = &map.definition.obstacles[0];
    assert_eq!(
        gate.start_box,
        Aabb::from_corners(Vec2::new(16.0, 16.0), Vec2::new(48.0, 48.0))
    );
    assert_eq!(
        gate.actions,
        vec![
            ObstacleAction::ChangeMusic("ambush".to_owned()),
            ObstacleAction::MoveUnit { to_revive: false },
            ObstacleAction::SetLives(3),
        ]
    );
    assert_eq!(
        gate.explosions,
        vec![
            ExplosionRecord {
                placements: vec![
                    Placement {
                        location: "1".to_owned(),
                        unit: "crystal".to_owned(),
                    },
                    Placement {
                        location: "2".to_owned(),
                        unit: "scourge".to_owned(),
                    },
                ],
                delay: 4,
            },
            ExplosionRecord {
                placements: vec![Placement {
                    location: "2".to_owned(),
                    unit: "zergling".to_owned(),
                }],
                delay: 0,
            },
        ]
    );
    assert_eq!(gate.wall_configurations().len(), 2);
}

#[test]
fn unknown_location_is_rejected() {
    let mut map = document();
    map["obstacle_2"]["exp_2"] = json!([["7"], ["zergling"], 1]);
    let error = parse(&map).expect_err("location 7 is undefined");
    assert!(matches!(
        error,
        MapFormatError::UnknownLocation { obstacle: 2, ref name } if name == "7"
    ));
}

#[test]
fn uneven_explosion_is_rejected() {
    let mut map = document();
    map["obstacle_2"]["exp_2"] = json!([["1", "2"], ["zergling"], 1]);
    let error = parse(&map).expect_err("two locations, one unit");
    assert!(matches!(error, MapFormatError::MismatchedExplosion { obstacle: 2, .. }));
}

#[test]
fn start_inside_a_wall_is_rejected() {
    let mut map = document();
    map["start_pos"] = json!([72, 40]);
    let error = parse(&map).expect_err("start overlaps the pillar");
    assert!(matches!(error, MapFormatError::StartInWall { .. }));

    // Half a cell off centre still clips the neighbouring wall.
    map["start_pos"] = json!([20, 24]);
    assert!(matches!(
        parse(&map),
        Err(MapFormatError::StartInWall { .. })
    ));
}

#[test]
fn missing_start_is_rejected() {
    let mut map = document();
    let _ = map.as_object_mut().map(|object| object.remove("start_pos"));
    assert!(matches!(parse(&map), Err(MapFormatError::MissingStart)));
}

#[test]
fn grid_shape_must_match_dimensions() {
    let mut map = document();
    map["tile_dat"][2] = json!([1, 0, 0, 0, 1]);
    assert!(matches!(
        parse(&map),
        Err(MapFormatError::RowLength {
            row: 2,
            expected: 8,
            found: 5
        })
    ));

    let mut map = document();
    map["map_height"] = json!(7);
    assert!(matches!(
        parse(&map),
        Err(MapFormatError::RowCount {
            expected: 7,
            found: 6
        })
    ));
}

#[test]
fn unknown_tiles_and_keys_are_reported() {
    let mut map = document();
    map["tile_dat"][4][3] = json!(42);
    assert!(matches!(
        parse(&map),
        Err(MapFormatError::UnknownTile { tile: 42, .. })
    ));

    let mut map = document();
    map["obstacle_x"] = json!({});
    assert!(matches!(
        parse(&map),
        Err(MapFormatError::MalformedKey { ref key }) if key == "obstacle_x"
    ));

    let mut map = document();
    map["obstacle_2"]["actions"] = json!([["add_lives", "two"]]);
    assert!(matches!(
        parse(&map),
        Err(MapFormatError::MalformedAction { obstacle: 2, ref action }) if action == "add_lives"
    ));
}

#[test]
fn custom_tile_table_changes_walls() {
    let tiles = TileTable::from_toml_str(
        r#"
        [[tile]]
        id = 0
        wall = false

        [[tile]]
        id = 1
        wall = true

        [[tile]]
        id = 3
        wall = false

        [[tile]]
        id = 4
        wall = true
        "#,
    )
    .expect("valid table");
    let map = parse_map(&document().to_string(), &tiles, HALF_WIDTH).expect("valid map");
    assert!(!map.definition.grid.is_wall_at(4, 2));
    assert!(map.definition.grid.is_wall_at(3, 3));
}

#[test]
fn invalid_json_is_reported() {
    assert!(matches!(
        parse_map("{ \"map_width\": ", &TileTable::default(), HALF_WIDTH),
        Err(MapFormatError::Json(_))
    ));
}
