//! Splitting a working brush by a plane

use crate::brush::bsp_brush::{BspBrush, BspSide};
use crate::float_types::Real;
use crate::geometry::plane::SIDE_FRONT;
use crate::geometry::{PlaneNum, PlaneTable, Winding, opposite};
use log::{debug, trace};

/// Split `brush` by plane `planenum` into front and back fragments.
///
/// A fragment that would be degenerate or smaller than `microvolume` is
/// dropped. When the plane does not really cut the brush, the whole brush is
/// returned on one side. Both fragments gain a cap side on the split plane,
/// marked as already used by a node.
pub fn split_brush(
    planes: &PlaneTable,
    brush: &BspBrush,
    planenum: PlaneNum,
    microvolume: Real,
) -> (Option<BspBrush>, Option<BspBrush>) {
    // the brush already has a side on the plane
    if brush.sides.iter().any(|s| s.plane == planenum) {
        return (None, Some(brush.clone()));
    }
    if brush.sides.iter().any(|s| s.plane == opposite(planenum)) {
        return (Some(brush.clone()), None);
    }

    let plane = planes.get(planenum);
    let (d_front, d_back) = brush.distance_range(plane);
    if d_front < 0.1 {
        return (None, Some(brush.clone()));
    }
    if d_back > -0.1 {
        return (Some(brush.clone()), None);
    }

    // the cut face, clipped to the brush
    let mut mid = Some(Winding::base_for_plane(&plane.normal, plane.dist));
    for side in &brush.sides {
        mid = match mid {
            Some(w) => w.chop(planes.get(opposite(side.plane)), 0.0),
            None => break,
        };
    }
    let mid = match mid {
        Some(w) if !w.is_tiny() => w,
        _ => {
            trace!("brush {}: split plane {planenum} only grazes it", brush.id);
            return if brush.mostly_on_side(plane) == SIDE_FRONT {
                (Some(brush.clone()), None)
            } else {
                (None, Some(brush.clone()))
            };
        },
    };

    let mut pieces: [Vec<BspSide>; 2] = [Vec::new(), Vec::new()];
    for side in &brush.sides {
        let Some(w) = &side.winding else {
            // bevels still bound both halves
            if side.bevel {
                for piece in &mut pieces {
                    piece.push(side.clone());
                }
            }
            continue;
        };
        let (front, back) = w.split(plane, 0.0);
        for (piece, winding) in pieces.iter_mut().zip([front, back]) {
            if let Some(winding) = winding {
                piece.push(BspSide {
                    winding: Some(winding),
                    tested: false,
                    ..side.clone()
                });
            }
        }
    }

    let mut fragments: [Option<BspBrush>; 2] = pieces.map(|sides| {
        let mut fragment = BspBrush {
            sides,
            ..brush.clone()
        };
        fragment.bound();
        let valid = fragment.windings().count() >= 3 && !fragment.has_bogus_bounds();
        valid.then_some(fragment)
    });

    if fragments.iter().any(Option::is_none) {
        if fragments.iter().all(Option::is_none) {
            debug!("brush {}: split removed brush", brush.id);
        } else {
            debug!("brush {}: split not on both sides", brush.id);
        }
        return match fragments {
            [Some(_), None] => (Some(brush.clone()), None),
            [None, Some(_)] => (None, Some(brush.clone())),
            _ => (None, None),
        };
    }

    // the cap inherits from the side facing the same way
    let inherit = brush
        .sides
        .iter()
        .filter(|s| s.original.is_some())
        .max_by(|a, b| {
            let da = planes.get(a.plane).normal.dot(&plane.normal);
            let db = planes.get(b.plane).normal.dot(&plane.normal);
            da.total_cmp(&db)
        });

    for (i, fragment) in fragments.iter_mut().enumerate() {
        let Some(fragment) = fragment else { continue };
        // front half is closed by the flipped plane, back half by the plane itself
        let (cap_plane, cap_winding) = if i == 0 {
            (opposite(planenum), mid.reversed())
        } else {
            (planenum, mid.clone())
        };
        fragment.sides.push(BspSide {
            plane: cap_plane,
            winding: Some(cap_winding),
            original: inherit.and_then(|s| s.original),
            contents: inherit.map(|s| s.contents).unwrap_or_default(),
            surface: inherit.map(|s| s.surface).unwrap_or_default(),
            visible: false,
            bevel: false,
            on_node: true,
            tested: false,
        });
    }

    for fragment in &mut fragments {
        if fragment
            .as_ref()
            .is_some_and(|f| f.volume(planes) < microvolume)
        {
            debug!("brush {}: tiny volume after clip", brush.id);
            *fragment = None;
        }
    }

    let [front, back] = fragments;
    (front, back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn cube(planes: &mut PlaneTable) -> BspBrush {
        BspBrush::from_bounds(
            planes,
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(8.0, 8.0, 8.0),
        )
        .unwrap()
    }

    #[test]
    fn split_conserves_volume_and_caps() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes);
        let cut = planes.intern(&Vector3::x(), 3.0).unwrap();
        let (front, back) = split_brush(&planes, &brush, cut, 1.0);
        let (front, back) = (front.unwrap(), back.unwrap());

        let total = front.volume(&planes) + back.volume(&planes);
        assert!((total - 512.0).abs() < 1e-6);
        assert!((back.volume(&planes) - 192.0).abs() < 1e-6);

        let cap = front.sides.last().unwrap();
        assert_eq!(cap.plane, opposite(cut));
        assert!(cap.on_node);
        assert!(!cap.visible);
        assert_eq!(back.sides.last().unwrap().plane, cut);
    }

    #[test]
    fn coincident_plane_adds_no_cap() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes);
        let face = planes.find(&Vector3::x(), 8.0).unwrap();
        let (front, back) = split_brush(&planes, &brush, face, 1.0);
        assert!(front.is_none());
        assert_eq!(back.unwrap().sides.len(), brush.sides.len());

        let (front, back) = split_brush(&planes, &brush, opposite(face), 1.0);
        assert!(back.is_none());
        assert_eq!(front.unwrap().sides.len(), brush.sides.len());
    }

    #[test]
    fn thin_cut_stays_whole() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes);
        let cut = planes.intern(&Vector3::z(), 7.95).unwrap();
        let (front, back) = split_brush(&planes, &brush, cut, 1.0);
        assert!(front.is_none());
        assert_eq!(back.unwrap().sides.len(), 6);
    }

    #[test]
    fn fragment_below_microvolume_is_dropped() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes);
        let cut = planes.intern(&Vector3::z(), 7.5).unwrap();
        // front slab is 32 cubic units
        let (front, back) = split_brush(&planes, &brush, cut, 40.0);
        assert!(front.is_none());
        assert!((back.unwrap().volume(&planes) - 480.0).abs() < 1e-6);
    }

    #[test]
    fn plane_missing_the_brush() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes);
        let far = planes.intern(&Vector3::y(), 100.0).unwrap();
        let (front, back) = split_brush(&planes, &brush, far, 1.0);
        assert!(front.is_none());
        assert!(back.is_some());
    }
}
