mod support;

use brushbsp::io::{
    IoError, to_glview, to_pointfile, to_prt, write_area_portal_pointfile, write_pointfile,
    write_prt,
};
use support::{leaky_room, sealed_room, two_rooms, two_rooms_with_plug};

#[test]
fn prt_header_matches_portal_lines() {
    let mut ctx = two_rooms();
    let tree = ctx.compile().expect("compiles");
    let text = to_prt(&tree);
    let mut lines = text.lines();

    assert_eq!(lines.next(), Some("PRT1"));
    let clusters: u32 = lines.next().expect("cluster line").parse().expect("number");
    let portals: usize = lines.next().expect("portal line").parse().expect("number");
    assert_eq!(clusters, tree.num_clusters);

    let body: Vec<&str> = lines.collect();
    assert_eq!(body.len(), portals);
    assert!(portals > 0);
    for line in body {
        let mut fields = line.split_whitespace();
        let points: usize = fields.next().expect("point count").parse().expect("number");
        let c0: u32 = fields.next().expect("cluster").parse().expect("number");
        let c1: u32 = fields.next().expect("cluster").parse().expect("number");
        assert!(c0 < clusters && c1 < clusters);
        assert_ne!(c0, c1);
        assert_eq!(line.matches('(').count(), points);
        assert!(points >= 3);
    }
}

#[test]
fn single_room_has_no_vis_portals() {
    let mut ctx = sealed_room();
    let tree = ctx.compile().expect("compiles");
    assert_eq!(to_prt(&tree), "PRT1\n1\n0\n");
}

#[test]
fn prt_file_is_written() {
    let mut ctx = two_rooms();
    let tree = ctx.compile().expect("compiles");
    let path = std::env::temp_dir().join(format!("brushbsp-{}.prt", std::process::id()));

    write_prt(&tree, &path).expect("writes");
    let written = std::fs::read_to_string(&path).expect("reads back");
    let _ = std::fs::remove_file(&path);
    assert_eq!(written, to_prt(&tree));
}

#[test]
fn pointfile_lists_every_leak_point() {
    let mut ctx = leaky_room();
    let tree = ctx.compile().expect("compiles");
    let leak = tree.leak.as_ref().expect("leak path");

    let text = to_pointfile(leak);
    assert_eq!(text.lines().count(), leak.points.len());
    let first: Vec<f64> = text
        .lines()
        .next()
        .expect("first point")
        .split_whitespace()
        .map(|v| v.parse().expect("coordinate"))
        .collect();
    let expected = [leak.points[0].x, leak.points[0].y, leak.points[0].z];
    for (got, want) in first.iter().zip(expected) {
        assert!(support::approx_eq(*got, want, 1e-5));
    }
}

#[test]
fn sealed_level_has_no_pointfile() {
    let mut ctx = sealed_room();
    let tree = ctx.compile().expect("compiles");
    let path = std::env::temp_dir().join(format!("brushbsp-{}.pts", std::process::id()));

    assert!(matches!(write_pointfile(&tree, &path), Err(IoError::NoLeak)));
    assert!(!path.exists());
}

#[test]
fn glview_faces_are_well_formed() {
    let mut ctx = sealed_room();
    let tree = ctx.compile().expect("compiles");
    let text = to_glview(&tree);

    let mut lines = text.lines();
    let mut faces = 0;
    while let Some(header) = lines.next() {
        let points: usize = header.trim().parse().expect("point count");
        for _ in 0..points {
            let values = lines.next().expect("point line").split_whitespace().count();
            assert_eq!(values, 6);
        }
        assert_eq!(lines.next(), Some(""));
        faces += 1;
    }
    // the six walls of the room, seen from inside
    assert!(faces >= 6);
}

#[test]
fn bypassed_area_portal_gets_a_pointfile() {
    let path = std::env::temp_dir().join(format!("brushbsp-{}-areaportal.pts", std::process::id()));

    let mut ctx = two_rooms();
    let tree = ctx.compile().expect("compiles");
    assert!(matches!(
        write_area_portal_pointfile(&tree.area_portals[0], &path),
        Err(IoError::NoLeak)
    ));

    let mut ctx = two_rooms_with_plug(80.0);
    let tree = ctx.compile().expect("compiles");
    let portal = &tree.area_portals[0];
    write_area_portal_pointfile(portal, &path).expect("writes");
    let written = std::fs::read_to_string(&path).expect("reads back");
    let _ = std::fs::remove_file(&path);

    let leak = portal.leak.as_ref().expect("bypass traced");
    assert_eq!(written, to_pointfile(leak));
    assert_eq!(written.lines().count(), leak.points.len());
}
