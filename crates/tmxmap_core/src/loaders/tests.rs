use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression as Level;
use flate2::write::ZlibEncoder;

use super::*;
use crate::gid::Gid;
use crate::model::{Layer, ObjectShape};
use crate::properties::PropertyType;

/// In-memory files keyed by path.
fn files(entries: &[(&str, &str)]) -> impl FnMut(&Path) -> io::Result<Vec<u8>> + use<> {
    let files: HashMap<PathBuf, Vec<u8>> = entries
        .iter()
        .map(|(path, contents)| (PathBuf::from(path), contents.as_bytes().to_vec()))
        .collect();
    move |path: &Path| {
        files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

fn load(entries: &[(&str, &str)]) -> TmxResult<Map<TileImage>> {
    MapLoader::with_reader(files(entries)).load_tmx_map("maps/level.tmx", PathImageLoader)
}

fn load_xml(xml: &str) -> TmxResult<Map<TileImage>> {
    load(&[("maps/level.tmx", xml)])
}

const TERRAIN_TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.10.2" name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
 <image source="terrain.png" width="32" height="32"/>
 <tile id="1">
  <properties>
   <property name="name" value="rock"/>
   <property name="solid" type="bool" value="true"/>
  </properties>
 </tile>
</tileset>
"#;

#[test]
fn test_minimal_map() {
    let map = load_xml(
        r#"<map version="1.10" orientation="orthogonal" renderorder="right-down" width="2" height="2" tilewidth="16" tileheight="16" infinite="0" nextlayerid="2" nextobjectid="1">
 <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="terrain.png" width="32" height="32"/>
 </tileset>
 <layer id="1" name="ground" width="2" height="2">
  <data encoding="csv">
1,2,
0,4
</data>
 </layer>
</map>"#,
    )
    .unwrap();

    assert_eq!(map.width, 2);
    assert_eq!(map.source, Some(PathBuf::from("maps/level.tmx")));
    assert_eq!(map.tile_gid(0, 0, 0).unwrap(), Gid(1));
    assert_eq!(map.tile_gid(1, 1, 0).unwrap(), Gid(4));
    assert!(matches!(
        map.tile_gid(2, 0, 0),
        Err(TmxError::InvalidCoordinate { x: 2, y: 0, layer: 0 })
    ));

    let image = map.tile_image(1, 0, 0).unwrap().unwrap();
    assert_eq!(image.source, PathBuf::from("maps/terrain.png"));
    assert_eq!(image.rect, Some(URect::new(16, 0, 32, 16)));
}

#[test]
fn test_external_tileset_paths_and_firstgid() {
    let map = load(&[
        (
            "maps/level.tmx",
            r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="5" source="../tilesets/terrain.tsx"/>
 <layer name="ground">
  <data encoding="csv">6</data>
 </layer>
</map>"#,
        ),
        ("tilesets/terrain.tsx", TERRAIN_TSX),
    ])
    .unwrap();

    let tileset = map.tileset_by_name("terrain").unwrap();
    assert_eq!(tileset.first_gid, 5);
    assert_eq!(tileset.source, Some(PathBuf::from("tilesets/terrain.tsx")));
    assert_eq!(
        tileset.image.as_ref().unwrap().source,
        PathBuf::from("tilesets/terrain.png")
    );

    let properties = map.tile_properties(0, 0, 0).unwrap().unwrap();
    assert_eq!(properties.value("name"), Some("rock"));
    assert_eq!(properties.get_as::<bool>("solid"), Some(true));
}

#[test]
fn test_missing_external_tileset() {
    let err = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="missing.tsx"/>
</map>"#,
    )
    .unwrap_err();
    assert!(
        matches!(err, TmxError::MissingExternalResource { ref path, .. } if path == Path::new("maps/missing.tsx"))
    );
}

#[test]
fn test_broken_external_tileset() {
    let err = load(&[
        (
            "maps/level.tmx",
            r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="broken.tsx"/>
</map>"#,
        ),
        ("maps/broken.tsx", r#"<tileset name="broken" wangsets="1"/>"#),
    ])
    .unwrap_err();
    match err {
        TmxError::InvalidExternalResource { source, .. } => {
            assert!(matches!(*source, TmxError::UnknownAttribute { element: "tileset", .. }));
        }
        other => panic!("expected InvalidExternalResource, got {other:?}"),
    }
}

fn tile_object_map(tileset_first: bool) -> String {
    let tileset = r#"<tileset firstgid="1" source="terrain.tsx"/>"#;
    let objects = r#"<objectgroup id="2" name="props">
  <object id="1" name="boulder" gid="2" x="32" y="48" width="16" height="16">
   <properties>
    <property name="solid" type="bool" value="false"/>
   </properties>
  </object>
 </objectgroup>"#;
    let (first, second) = if tileset_first {
        (tileset, objects)
    } else {
        (objects, tileset)
    };
    format!(
        r#"<map width="4" height="4" tilewidth="16" tileheight="16">
 {first}
 {second}
</map>"#
    )
}

#[test]
fn test_self_referencing_external_tileset() {
    let err = load(&[
        (
            "maps/level.tmx",
            r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="loop.tsx"/>
</map>"#,
        ),
        ("maps/loop.tsx", r#"<tileset firstgid="1" source="loop.tsx"/>"#),
    ])
    .unwrap_err();
    match err {
        TmxError::InvalidExternalResource { path, source } => {
            assert_eq!(path, PathBuf::from("maps/loop.tsx"));
            assert!(
                matches!(*source, TmxError::CircularExternalResource(ref cycle) if cycle == Path::new("maps/loop.tsx"))
            );
        }
        other => panic!("expected InvalidExternalResource, got {other:?}"),
    }
}

#[test]
fn test_tile_object_inherits_tile_properties() {
    for tileset_first in [true, false] {
        let xml = tile_object_map(tileset_first);
        let map = load(&[("maps/level.tmx", xml.as_str()), ("maps/terrain.tsx", TERRAIN_TSX)]).unwrap();

        let boulder = map.object_by_name("boulder").unwrap();
        assert_eq!(boulder.properties.value("name"), Some("rock"));
        // the object's own value wins
        assert_eq!(boulder.properties.get_as::<bool>("solid"), Some(false));
        assert_eq!(boulder.y, 32.0);
        assert!(map.object_image(boulder).is_some());
    }
}

#[test]
fn test_tile_objects_keep_bottom_left_origin_when_configured() {
    let xml = tile_object_map(true);
    let config = LoaderConfig {
        tile_objects_top_left: false,
        ..Default::default()
    };
    let map = MapLoader::with_reader(files(&[
        ("maps/level.tmx", xml.as_str()),
        ("maps/terrain.tsx", TERRAIN_TSX),
    ]))
    .with_config(config)
    .load_tmx_map("maps/level.tmx", PathImageLoader)
    .unwrap();
    assert_eq!(map.object_by_name("boulder").unwrap().y, 48.0);
}

#[test]
fn test_reserved_property_name() {
    let xml = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <layer name="ground">
  <properties>
   <property name="width" type="int" value="3"/>
  </properties>
  <data encoding="csv">0</data>
 </layer>
</map>"#;
    let err = load_xml(xml).unwrap_err();
    assert!(matches!(
        err,
        TmxError::ReservedPropertyName { element: "layer", ref property } if property == "width"
    ));

    let map = MapLoader::with_reader(files(&[("maps/level.tmx", xml)]))
        .with_config(LoaderConfig {
            allow_reserved_property_names: true,
            ..Default::default()
        })
        .load_tmx_map("maps/level.tmx", PathImageLoader)
        .unwrap();
    let layer = map.layer_by_name("ground").unwrap();
    assert_eq!(layer.properties().get_as::<i32>("width"), Some(3));
}

#[test]
fn test_strict_schema_errors() {
    let unknown_element = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16"><wangsets/></map>"#,
    );
    assert!(matches!(unknown_element, Err(TmxError::UnknownElement(ref name)) if name == "wangsets"));

    let unknown_attribute = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16" colour="red"/>"#,
    );
    assert!(matches!(
        unknown_attribute,
        Err(TmxError::UnknownAttribute { element: "map", ref attribute }) if attribute == "colour"
    ));

    let missing_attribute = load_xml(r#"<map width="1" height="1" tilewidth="16"/>"#);
    assert!(matches!(
        missing_attribute,
        Err(TmxError::MissingAttribute { element: "map", attribute: "tileheight" })
    ));

    let unknown_relationship = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16"><frame tileid="0" duration="1"/></map>"#,
    );
    assert!(matches!(
        unknown_relationship,
        Err(TmxError::UnknownRelationship { parent: "map", child: "frame" })
    ));

    let invalid_value = load_xml(r#"<map width="wide" height="1" tilewidth="16" tileheight="16"/>"#);
    assert!(matches!(invalid_value, Err(TmxError::InvalidAttribute { .. })));
}

#[test]
fn test_infinite_maps_are_unsupported() {
    let err = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16" infinite="1">
 <layer name="ground">
  <data encoding="csv">
   <chunk x="0" y="0" width="16" height="16">0</chunk>
  </data>
 </layer>
</map>"#,
    )
    .unwrap_err();
    assert!(matches!(err, TmxError::UnsupportedFeature(_)));
}

#[test]
fn test_embedded_image_is_unsupported() {
    let err = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <imagelayer name="sky"><image format="png" width="4" height="4"/></imagelayer>
</map>"#,
    )
    .unwrap_err();
    assert!(matches!(err, TmxError::UnsupportedFeature(_)));
}

#[test]
fn test_base64_zlib_layer() {
    let raw: Vec<u8> = [1u32, 0x8000_0002, 0, 3]
        .iter()
        .flat_map(|gid| gid.to_le_bytes())
        .collect();
    let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
    encoder.write_all(&raw).unwrap();
    let payload = STANDARD.encode(encoder.finish().unwrap());

    let xml = format!(
        r#"<map width="2" height="2" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="terrain.png" width="32" height="32"/>
 </tileset>
 <layer name="ground">
  <data encoding="base64" compression="zlib">
   {payload}
  </data>
 </layer>
</map>"#
    );
    let map = load_xml(&xml).unwrap();

    let flipped = map.tile_gid(1, 0, 0).unwrap();
    assert_eq!(flipped.id(), 2);
    assert!(flipped.flags().horizontal);
    assert!(map.tile_image_by_gid(flipped).unwrap().flags.horizontal);
    assert_eq!(map.tile_gid(1, 1, 0).unwrap(), Gid(3));
}

#[test]
fn test_short_layer_data() {
    let err = load_xml(
        r#"<map width="2" height="2" tilewidth="16" tileheight="16">
 <layer name="ground"><data encoding="csv">1,2,3</data></layer>
</map>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TmxError::MalformedLayer { expected: 4, actual: 3, .. }
    ));
}

#[test]
fn test_xml_tile_children() {
    let map = load_xml(
        r#"<map width="2" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="terrain.png" width="32" height="32"/>
 </tileset>
 <layer name="ground">
  <data>
   <tile gid="4"/>
   <tile/>
  </data>
 </layer>
</map>"#,
    )
    .unwrap();
    let layer = map.layers[0].as_tile_layer().unwrap();
    assert_eq!(layer.data, vec![vec![Gid(4), Gid::EMPTY]]);
}

#[test]
fn test_unknown_gid_in_layer() {
    let err = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <layer name="ground"><data encoding="csv">7</data></layer>
</map>"#,
    )
    .unwrap_err();
    assert!(matches!(err, TmxError::UnknownTile(7)));
}

#[test]
fn test_overlapping_tilesets() {
    let err = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="a" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="a.png" width="32" height="32"/>
 </tileset>
 <tileset firstgid="3" name="b" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="b.png" width="32" height="32"/>
 </tileset>
</map>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TmxError::OverlappingTileset { first_gid: 3, next_free: 5, .. }
    ));
}

#[test]
fn test_tileset_range_must_fit_in_gid_bits() {
    for first_gid in ["4294967295", "536870912", "536870910"] {
        let xml = format!(
            r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="{first_gid}" name="huge" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="huge.png" width="32" height="32"/>
 </tileset>
</map>"#
        );
        let err = load_xml(xml.as_str()).unwrap_err();
        assert!(
            matches!(err, TmxError::GidRangeOverflow { tile_count: 4, .. }),
            "firstgid {first_gid}: {err:?}"
        );
    }

    // the last four gids are still usable
    let map = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="536870908" name="top" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="top.png" width="32" height="32"/>
 </tileset>
</map>"#,
    )
    .unwrap();
    assert_eq!(map.tilesets[0].end_gid(), 1 << 29);
    assert_eq!(map.images.len(), 4);
}

#[test]
fn test_oversized_margin_yields_no_slots() {
    let map = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="padded" tilewidth="16" tileheight="16" margin="3000000000" tilecount="4" columns="2">
  <image source="padded.png" width="32" height="32"/>
 </tileset>
</map>"#,
    )
    .unwrap();
    assert_eq!(map.tilesets[0].regions().map(|regions| regions.len()), Some(0));
    assert!(map.images.is_empty());
}

#[test]
fn test_missing_firstgid_is_assigned() {
    let map = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset name="a" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="a.png" width="32" height="32"/>
 </tileset>
 <tileset name="b" tilewidth="16" tileheight="16" tilecount="2" columns="2">
  <image source="b.png" width="32" height="16"/>
 </tileset>
</map>"#,
    )
    .unwrap();
    assert_eq!(map.tileset_by_name("a").unwrap().first_gid, 1);
    assert_eq!(map.tileset_by_name("b").unwrap().first_gid, 5);
    assert_eq!(map.images.len(), 6);
}

#[test]
fn test_groups_and_image_layers() {
    let map = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <group id="1" name="background" visible="0">
  <imagelayer id="2" name="sky" offsetx="4" repeatx="1">
   <image source="../art/sky.png" width="320" height="180"/>
  </imagelayer>
 </group>
 <objectgroup id="3" name="triggers">
  <object id="7" name="door" x="8" y="8">
   <polygon points="0,0 16,0 16,-8"/>
  </object>
  <object id="8" name="spawn" x="1" y="2"><point/></object>
  <object id="9" name="sign" x="0" y="0" width="64" height="16">
   <text wrap="1" halign="center">Hello</text>
  </object>
 </objectgroup>
</map>"#,
    )
    .unwrap();

    assert_eq!(map.iter_layers().count(), 3);
    assert_eq!(map.visible_layers().count(), 1);

    let Layer::Group(group) = map.layer_by_name("background").unwrap() else {
        panic!("expected a group layer");
    };
    let sky = group.layers[0].as_image_layer().unwrap();
    assert_eq!(sky.info.offset.x, 4.0);
    assert!(sky.repeat_x);
    assert_eq!(sky.image.as_ref().unwrap().source, PathBuf::from("art/sky.png"));
    assert_eq!(sky.image.as_ref().unwrap().rect, None);

    let door = map.object_by_id(7).unwrap();
    assert_eq!((door.width, door.height), (16.0, 8.0));
    assert!(matches!(door.shape, ObjectShape::Polygon { ref points } if points.len() == 3));
    assert!(matches!(map.object_by_name("spawn").unwrap().shape, ObjectShape::Point));

    let ObjectShape::Text(text) = &map.object_by_name("sign").unwrap().shape else {
        panic!("expected a text object");
    };
    assert_eq!(text.text, "Hello");
    assert!(text.wrap);
}

#[test]
fn test_animation_and_collision_tiles() {
    let map = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="water" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="water.png" width="32" height="32"/>
  <tile id="0">
   <animation>
    <frame tileid="0" duration="100"/>
    <frame tileid="3" duration="150"/>
   </animation>
   <objectgroup draworder="index">
    <object id="1" x="0" y="8" width="16" height="8"/>
   </objectgroup>
  </tile>
 </tileset>
</map>"#,
    )
    .unwrap();

    let tile = map.tile(Gid(1)).unwrap();
    assert_eq!(tile.animation.len(), 2);
    assert_eq!(tile.animation[1].tile_id, 3);
    assert_eq!(tile.animation[1].duration, 150);

    let colliders: Vec<_> = map.tile_colliders().collect();
    assert_eq!(colliders.len(), 1);
    assert_eq!(colliders[0].0, 1);
    assert_eq!(colliders[0].1.objects[0].height, 8.0);
}

#[test]
fn test_property_text_values_and_classes() {
    let map = load_xml(
        r##"<map width="1" height="1" tilewidth="16" tileheight="16">
 <properties>
  <property name="intro">first line
second line</property>
  <property name="tint" type="color" value="#ff102030"/>
  <property name="spawn" type="class" propertytype="Spawn">
   <properties>
    <property name="count" type="int" value="3"/>
   </properties>
  </property>
 </properties>
</map>"##,
    )
    .unwrap();

    assert_eq!(map.properties.value("intro"), Some("first line\nsecond line"));
    assert_eq!(map.properties.get("tint").unwrap().property_type, PropertyType::Color);

    let spawn = map.properties.get("spawn").unwrap();
    assert_eq!(spawn.property_type, PropertyType::Class);
    assert_eq!(spawn.custom_type.as_deref(), Some("Spawn"));
    assert_eq!(spawn.members.get_as::<i32>("count"), Some(3));
}

#[test]
fn test_repeated_properties_blocks_merge() {
    let map = load_xml(
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <layer name="ground" width="1" height="1">
  <properties>
   <property name="depth" type="int" value="1"/>
   <property name="music" value="calm"/>
  </properties>
  <properties>
   <property name="depth" type="int" value="2"/>
  </properties>
 </layer>
</map>"#,
    )
    .unwrap();

    let properties = map.layer_by_name("ground").unwrap().properties();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties.value("music"), Some("calm"));
    assert_eq!(properties.get_as::<i32>("depth"), Some(2));
}

#[test]
fn test_load_tsx_tileset() {
    let mut loader = MapLoader::with_reader(files(&[("tilesets/terrain.tsx", TERRAIN_TSX)]));
    let tileset = loader.load_tsx_tileset("tilesets/terrain.tsx").unwrap();
    assert_eq!(tileset.first_gid, 1);
    assert_eq!(tileset.tile_count, 4);
    assert_eq!(tileset.columns, 2);
    assert!(tileset.tile(1).is_some());
}

#[test]
fn test_wrong_root() {
    let err = load_xml(TERRAIN_TSX).unwrap_err();
    assert!(matches!(err, TmxError::MalformedDocument(_)));
}

#[test]
fn test_closure_image_loader() {
    let mut calls = 0;
    let map = MapLoader::with_reader(files(&[(
        "maps/level.tmx",
        r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="terrain.png" width="32" height="32"/>
 </tileset>
 <layer name="ground"><data encoding="csv">2</data></layer>
</map>"#,
    )]))
    .with_config(LoaderConfig {
        load_all_tiles: false,
        ..Default::default()
    })
    .load_tmx_map(
        "maps/level.tmx",
        |_: &ImageSource, rect: Option<URect>, _: Option<TileFlags>| {
            calls += 1;
            rect
        },
    )
    .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(map.images[&Gid(2)], Some(URect::new(16, 0, 32, 16)));
}
