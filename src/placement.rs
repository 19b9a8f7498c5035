// =============================================================================
// placement.rs - Position du widget flottant
// placement.rs - Floating widget position
// =============================================================================

/// Paramètres de placement d'un widget près du pointeur
/// Parameters for placing a widget next to the pointer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRequest {
    pub pointer_x: f64,
    pub pointer_y: f64,
    pub widget_width: f64,
    pub widget_height: f64,
    /// Hauteur du libellé rendu sous le widget circulaire
    /// Height of the label rendered below the circular widget
    pub label_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub gap: f64,
}

/// Coin supérieur gauche du widget / Widget top-left corner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
}

/// Ancre le widget en bas à droite du pointeur, puis le bascule axe par axe
/// s'il sort du viewport. Les deux axes ne s'influencent jamais.
/// Anchors the widget bottom-right of the pointer, then flips it per axis when
/// it would leave the viewport. The two axes never interact.
pub fn plan_position(req: &PlacementRequest) -> Placement {
    let mut left = req.pointer_x + req.gap;
    let mut top = req.pointer_y + req.gap;

    // Bascule à gauche / Flip to the left
    if left + req.widget_width + req.gap > req.viewport_width {
        left = req.pointer_x - req.widget_width - req.gap;
    }

    // Bascule au-dessus, libellé compris / Flip above, label included
    if top + req.widget_height + req.label_height + req.gap > req.viewport_height {
        top = req.pointer_y - req.widget_height - req.label_height - req.gap;
    }

    Placement { left, top }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VW: f64 = 1024.0;
    const VH: f64 = 768.0;

    fn request(x: f64, y: f64) -> PlacementRequest {
        PlacementRequest {
            pointer_x: x,
            pointer_y: y,
            widget_width: 150.0,
            widget_height: 150.0,
            label_height: 40.0,
            viewport_width: VW,
            viewport_height: VH,
            gap: 10.0,
        }
    }

    fn assert_contained(x: f64, y: f64) {
        let Placement { left, top } = plan_position(&request(x, y));
        assert!(left >= 0.0 && left + 150.0 <= VW, "x overflow at ({x}, {y}): left={left}");
        assert!(top >= 0.0 && top + 150.0 + 40.0 <= VH, "y overflow at ({x}, {y}): top={top}");
    }

    #[test]
    fn test_default_bottom_right() {
        assert_eq!(plan_position(&request(100.0, 100.0)), Placement { left: 110.0, top: 110.0 });
    }

    #[test]
    fn test_flip_each_axis_independently() {
        // Bord droit seul / Right edge only
        assert_eq!(plan_position(&request(1000.0, 100.0)), Placement { left: 840.0, top: 110.0 });
        // Bord bas seul / Bottom edge only
        assert_eq!(plan_position(&request(100.0, 700.0)), Placement { left: 110.0, top: 500.0 });
        // Les deux / Both
        assert_eq!(plan_position(&request(1024.0, 768.0)), Placement { left: 864.0, top: 568.0 });
    }

    #[test]
    fn test_corners_and_edge_centers_stay_inside() {
        let points = [
            (0.0, 0.0),
            (VW, 0.0),
            (0.0, VH),
            (VW, VH),
            (VW / 2.0, 0.0),
            (VW / 2.0, VH),
            (0.0, VH / 2.0),
            (VW, VH / 2.0),
        ];
        for (x, y) in points {
            assert_contained(x, y);
        }
    }

    #[test]
    fn test_whole_viewport_sweep_stays_inside() {
        let mut y = 0.0;
        while y <= VH {
            let mut x = 0.0;
            while x <= VW {
                assert_contained(x, y);
                x += 16.0;
            }
            y += 16.0;
        }
    }
}
