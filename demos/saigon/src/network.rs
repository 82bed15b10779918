//! Synthetic District 1 / District 3 road network.
//!
//! Nine intersections laid out roughly like central Ho Chi Minh City: a
//! boulevard spine along the river, two parallel collectors, and a tangle
//! of residential lanes behind Ben Thanh market.

use sr_core::{GeoPoint, NodeId};
use sr_spatial::{EdgeSpec, RoadClass, RoadNetwork, RoadNetworkBuilder};

/// Coordinates of the named intersections, for building requests.
pub struct Landmarks {
    pub tan_dinh: GeoPoint,
    pub turtle_lake: GeoPoint,
    pub ben_thanh: GeoPoint,
    pub nguyen_hue: GeoPoint,
    pub bach_dang: GeoPoint,
}

pub fn build_network() -> (RoadNetwork, Landmarks) {
    let mut b = RoadNetworkBuilder::new();

    let tan_dinh    = b.add_node(GeoPoint::new(10.7890, 106.6905));
    let turtle_lake = b.add_node(GeoPoint::new(10.7826, 106.6958));
    let dakao       = b.add_node(GeoPoint::new(10.7880, 106.6990));
    let cathedral   = b.add_node(GeoPoint::new(10.7798, 106.6990));
    let ben_thanh   = b.add_node(GeoPoint::new(10.7725, 106.6980));
    let bui_vien    = b.add_node(GeoPoint::new(10.7670, 106.6930));
    let nguyen_hue  = b.add_node(GeoPoint::new(10.7740, 106.7040));
    let opera       = b.add_node(GeoPoint::new(10.7768, 106.7031));
    let bach_dang   = b.add_node(GeoPoint::new(10.7750, 106.7075));

    // Boulevard spine.
    b.add_street(tan_dinh, dakao, RoadClass::Primary);
    b.add_street(dakao, opera, RoadClass::Primary);
    b.add_street(opera, bach_dang, RoadClass::Primary);

    // Collectors.
    b.add_street(tan_dinh, turtle_lake, RoadClass::Secondary);
    b.add_street(turtle_lake, cathedral, RoadClass::Secondary);
    b.add_street(cathedral, opera, RoadClass::Tertiary);
    b.add_street(cathedral, ben_thanh, RoadClass::Tertiary);
    b.add_street(ben_thanh, nguyen_hue, RoadClass::Secondary);
    b.add_street(nguyen_hue, bach_dang, RoadClass::Secondary);
    b.add_street(nguyen_hue, opera, RoadClass::Tertiary);

    // Back lanes: curved, with posted limits.
    b.add_road(
        turtle_lake,
        bui_vien,
        EdgeSpec::new(1_900.0, RoadClass::Residential)
            .with_speed_limit(30.0)
            .with_geometry(vec![
                GeoPoint::new(10.7826, 106.6958),
                GeoPoint::new(10.7760, 106.6915),
                GeoPoint::new(10.7670, 106.6930),
            ]),
    );
    b.add_road(
        bui_vien,
        ben_thanh,
        EdgeSpec::new(850.0, RoadClass::LivingStreet).with_speed_limit(20.0),
    );

    let at = |n: NodeId| b.node_pos(n);
    let places = Landmarks {
        tan_dinh:    at(tan_dinh),
        turtle_lake: at(turtle_lake),
        ben_thanh:   at(ben_thanh),
        nguyen_hue:  at(nguyen_hue),
        bach_dang:   at(bach_dang),
    };
    (b.build(), places)
}
