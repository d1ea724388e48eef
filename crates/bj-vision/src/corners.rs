use crate::detect::Point;
use crate::GeometryError;

/// Canonicalize the four corners of a candidate quad.
///
/// Corners are split into top and bottom pairs around the centroid and
/// ordered left-to-right within each pair. Sideways cards (wider than tall)
/// get the order rotated one step so the first corner is always the card's
/// visual top-left and the winding matches the destination rectangle used
/// for rectification. The result depends only on the set of points, never on
/// their input order.
///
/// A corner set that does not split into exactly two top and two bottom
/// points has no defined ordering and is rejected.
pub fn canonical_corners(corners: &[Point; 4]) -> Result<[Point; 4], GeometryError> {
    let cy = corners.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;

    let mut top = Vec::with_capacity(2);
    let mut bottom = Vec::with_capacity(2);
    for &p in corners {
        if (p.y as f64) < cy {
            top.push(p);
        } else {
            bottom.push(p);
        }
    }
    if top.len() != 2 || bottom.len() != 2 {
        return Err(GeometryError::CornerPartition);
    }

    let (tl, tr) = if top[0].x > top[1].x {
        (top[1], top[0])
    } else {
        (top[0], top[1])
    };
    let (bl, br) = if bottom[0].x > bottom[1].x {
        (bottom[1], bottom[0])
    } else {
        (bottom[0], bottom[1])
    };

    Ok(if is_horizontal(tl, tr, bl, br) {
        [tr, br, bl, tl]
    } else {
        [tl, tr, br, bl]
    })
}

/// A quad lies sideways when its combined edge width beats its combined edge
/// height. Both are sums of squared spans; square roots would not change the
/// ordering.
fn is_horizontal(tl: Point, tr: Point, bl: Point, br: Point) -> bool {
    let height = sq(bl.y - tl.y) + sq(br.y - tr.y);
    let width = sq(tr.x - tl.x) + sq(br.x - bl.x);
    width > height
}

fn sq(v: i32) -> i64 {
    let v = v as i64;
    v * v
}
