// Built-in layout tables for the WEBPRO input sheet (Ver3 series)
//
// Three registries cover the three output shapes:
// - `relational()`: entity tables with synthesized primary/foreign keys
// - `wide()`: every sheet flattened with prefixed field names into one table
// - `sheet_dump()`: whole-sheet consolidation with header+unit column names
//
// Row offsets are 0-based absolute sheet rows.

use super::{
    BasicInfoSpec, Coercion, ColumnSpec, GroupSpec, HeaderFusion, IdSpec, LayoutRegistry,
    LayoutSpec, SkipMarker,
};

pub const BASIC_INFO_SHEET: &str = "0) 基本情報";

/// Boundary labels in the wall construction sheet (not material layers)
pub const WALL_BOUNDARY_LABELS: [&str; 2] = ["室内側", "室外側"];

/// First data row of the relational layouts (Excel row 11)
const RELATIONAL_DATA_ROW: usize = 10;

fn c(index: usize, field: &str) -> ColumnSpec {
    ColumnSpec::new(index, field)
}

fn cc(index: usize, field: &str, coercion: Coercion) -> ColumnSpec {
    ColumnSpec::coerced(index, field, coercion)
}

fn strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn seq(field: &str, prefix: &str) -> IdSpec {
    IdSpec::Sequence {
        field: field.to_string(),
        prefix: prefix.to_string(),
    }
}

/// Field names of `columns` whose index falls in `range`
fn fields_in(columns: &[ColumnSpec], range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    columns
        .iter()
        .filter(|col| range.contains(&col.index))
        .map(|col| col.field.clone())
        .collect()
}

struct Group<'a> {
    parent: &'a str,
    child: &'a str,
    parent_markers: &'a [usize],
    child_markers: &'a [usize],
    name_fields: &'a [&'a str],
    parent_id: &'a str,
    child_id: &'a str,
    context: &'a [&'a str],
    parent_row_is_child: bool,
}

impl Group<'_> {
    fn build(self, parent_fields: Vec<String>, child_fields: Vec<String>) -> GroupSpec {
        GroupSpec {
            parent_entity: self.parent.to_string(),
            child_entity: self.child.to_string(),
            parent_markers: self.parent_markers.to_vec(),
            child_markers: self.child_markers.to_vec(),
            skip_markers: Vec::new(),
            parent_name_fields: strings(self.name_fields),
            parent_id_field: self.parent_id.to_string(),
            child_id_field: self.child_id.to_string(),
            child_order_field: None,
            parent_fields,
            child_fields,
            parent_context: strings(self.context),
            parent_row_is_child: self.parent_row_is_child,
        }
    }
}

/// Relational tables: one layout per entity, parent/child sheets split
pub fn relational() -> LayoutRegistry {
    use Coercion::{EmptyIfBlank, Flag, NullIfBlank, Priority};
    let row = RELATIONAL_DATA_ROW;

    let rooms = LayoutSpec::flat(
        "rooms",
        "1) 室仕様",
        row,
        vec![
            c(0, "floor"),
            c(1, "room_name"),
            c(2, "building_use"),
            c(3, "room_use_major"),
            c(4, "room_use_minor"),
            c(5, "area"),
            c(6, "floor_height"),
            c(7, "ceiling_height"),
            cc(8, "is_ac_target", Flag),
            cc(9, "is_vent_target", Flag),
            cc(10, "is_light_target", Flag),
            cc(11, "is_hw_target", Flag),
            cc(12, "sub_building_name", EmptyIfBlank),
            cc(13, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0, 1])
    .with_id(seq("room_id", "R"));

    let zones = LayoutSpec::flat(
        "zones",
        "2-1) 空調ゾーン",
        row,
        vec![
            c(0, "room_floor"),
            c(1, "room_name"),
            c(2, "room_use_major"),
            c(3, "room_use_minor"),
            c(4, "room_area"),
            c(5, "floor_height"),
            c(6, "ceiling_height"),
            c(7, "zone_floor"),
            c(8, "zone_name"),
            c(9, "ahu_group_room_load"),
            c(10, "ahu_group_oa_load"),
            cc(11, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0, 1])
    .with_id(seq("zone_id", "Z"));

    let wall_columns = vec![
        c(0, "wall_name"),
        c(1, "wall_type"),
        c(2, "u_value"),
        c(3, "material_no"),
        c(4, "material_name"),
        c(5, "conductivity"),
        c(6, "thickness_mm"),
        c(7, "absorption"),
        cc(8, "note", EmptyIfBlank),
    ];
    let mut wall_group = Group {
        parent: "wall_specs",
        child: "wall_layers",
        parent_markers: &[0],
        child_markers: &[3],
        name_fields: &["wall_name"],
        parent_id: "wall_spec_id",
        child_id: "wall_layer_id",
        context: &[],
        parent_row_is_child: false,
    }
    .build(
        strings(&["wall_name", "wall_type", "u_value", "absorption", "note"]),
        strings(&["material_no", "material_name", "conductivity", "thickness_mm"]),
    );
    wall_group.child_order_field = Some("layer_order".to_string());
    wall_group.skip_markers = vec![SkipMarker {
        column: 4,
        values: strings(&WALL_BOUNDARY_LABELS),
    }];
    let walls = LayoutSpec::flat("walls", "2-2) 外壁構成 ", row, wall_columns)
        .with_grouping(wall_group);

    let windows = LayoutSpec::flat(
        "window_specs",
        "2-3) 窓仕様",
        row,
        vec![
            c(0, "window_name"),
            c(1, "u_value_total"),
            c(2, "eta_value_total"),
            c(3, "frame_type"),
            c(4, "glass_type"),
            c(5, "u_value_glass"),
            c(6, "eta_value_glass"),
            cc(7, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0])
    .with_id(IdSpec::FromColumn {
        field: "window_spec_id".to_string(),
        column: 0,
    });

    let envelope_columns = vec![
        c(0, "floor"),
        c(1, "zone_name"),
        c(2, "direction"),
        c(3, "shade_coef_cool"),
        c(4, "shade_coef_heat"),
        c(5, "wall_spec_name"),
        c(6, "wall_area"),
        cc(7, "window_spec_name", NullIfBlank),
        cc(8, "window_area", NullIfBlank),
        cc(9, "blind", NullIfBlank),
        cc(10, "note", EmptyIfBlank),
    ];
    let envelope_group = Group {
        parent: "envelope_zones",
        child: "envelopes",
        parent_markers: &[0, 1],
        child_markers: &[2, 5],
        name_fields: &["floor", "zone_name"],
        parent_id: "envelope_zone_id",
        child_id: "envelope_id",
        context: &["floor", "zone_name"],
        parent_row_is_child: true,
    }
    .build(
        fields_in(&envelope_columns, 0..=1),
        fields_in(&envelope_columns, 2..=10),
    );
    let envelopes = LayoutSpec::flat("envelopes", "2-4) 外皮 ", row, envelope_columns)
        .with_grouping(envelope_group);

    let heat_source_columns = vec![
        c(0, "group_name"),
        c(1, "simultaneous_supply"),
        c(2, "unit_control"),
        c(3, "operation_mode"),
        cc(4, "storage_capacity_mj", NullIfBlank),
        c(5, "equipment_type"),
        cc(6, "priority_cool", Priority),
        c(7, "quantity_cool"),
        c(8, "supply_temp_cool"),
        c(9, "cooling_capacity_kw"),
        c(10, "main_power_cool_kw"),
        c(11, "aux_power_cool_kw"),
        c(12, "pump_power_cool_kw"),
        c(13, "ct_capacity_kw"),
        c(14, "ct_fan_power_kw"),
        c(15, "ct_pump_power_kw"),
        cc(16, "priority_heat", Priority),
        c(17, "quantity_heat"),
        c(18, "supply_temp_heat"),
        c(19, "heating_capacity_kw"),
        c(20, "main_power_heat_kw"),
        c(21, "aux_power_heat_kw"),
        c(22, "pump_power_heat_kw"),
        cc(23, "note", EmptyIfBlank),
    ];
    let mut hs_parent_fields = fields_in(&heat_source_columns, 0..=4);
    hs_parent_fields.push("note".to_string());
    let heat_source_group = Group {
        parent: "hs_groups",
        child: "hs_units",
        parent_markers: &[0],
        child_markers: &[5],
        name_fields: &["group_name"],
        parent_id: "hs_group_id",
        child_id: "hs_unit_id",
        context: &[],
        parent_row_is_child: true,
    }
    .build(hs_parent_fields, fields_in(&heat_source_columns, 5..=22));
    let heat_sources = LayoutSpec::flat("heat_sources", "2-5) 熱源", row, heat_source_columns)
        .with_grouping(heat_source_group);

    let pump_columns = vec![
        c(0, "group_name"),
        c(1, "unit_control"),
        c(2, "temp_diff_cool"),
        c(3, "temp_diff_heat"),
        cc(4, "priority", Priority),
        c(5, "quantity"),
        c(6, "flow_rate_m3h"),
        c(7, "power_kw"),
        c(8, "flow_control"),
        c(9, "min_flow_ratio_pct"),
        cc(10, "note", EmptyIfBlank),
    ];
    let mut pump_parent_fields = fields_in(&pump_columns, 0..=3);
    pump_parent_fields.push("note".to_string());
    let pump_group = Group {
        parent: "pump_groups",
        child: "pump_units",
        parent_markers: &[0],
        child_markers: &[4],
        name_fields: &["group_name"],
        parent_id: "pump_group_id",
        child_id: "pump_unit_id",
        context: &[],
        parent_row_is_child: true,
    }
    .build(pump_parent_fields, fields_in(&pump_columns, 4..=9));
    let pumps = LayoutSpec::flat("pumps", "2-6) 2次ﾎﾟﾝﾌﾟ", row, pump_columns)
        .with_grouping(pump_group);

    let ahu_columns = vec![
        c(0, "group_name"),
        c(1, "quantity"),
        c(2, "ahu_type"),
        c(3, "cooling_capacity_kw"),
        c(4, "heating_capacity_kw"),
        c(5, "design_oa_flow_m3h"),
        c(6, "fan_supply_kw"),
        c(7, "fan_return_kw"),
        c(8, "fan_oa_kw"),
        c(9, "fan_exhaust_kw"),
        c(10, "volume_control"),
        c(11, "min_volume_ratio_pct"),
        c(12, "preheat_oa_stop"),
        c(13, "oa_cooling_control"),
        c(14, "hex_type"),
        c(15, "hex_name"),
        c(16, "hex_flow_m3h"),
        c(17, "hex_eff_cool"),
        c(18, "hex_eff_heat"),
        c(19, "hex_auto_bypass"),
        c(20, "hex_rotor_power_kw"),
        c(21, "pump_group_cool"),
        c(22, "pump_group_heat"),
        c(23, "hs_group_cool"),
        c(24, "hs_group_heat"),
        cc(25, "note", EmptyIfBlank),
    ];
    let mut ahu_parent_fields = vec!["group_name".to_string()];
    ahu_parent_fields.extend(fields_in(&ahu_columns, 21..=25));
    let ahu_group = Group {
        parent: "ahu_groups",
        child: "ahu_units",
        parent_markers: &[0],
        child_markers: &[2],
        name_fields: &["group_name"],
        parent_id: "ahu_group_id",
        child_id: "ahu_unit_id",
        context: &[],
        parent_row_is_child: true,
    }
    .build(ahu_parent_fields, fields_in(&ahu_columns, 1..=20));
    let ahus = LayoutSpec::flat("ahus", "2-7) 空調機", row, ahu_columns).with_grouping(ahu_group);

    let vent_rooms = LayoutSpec::flat(
        "vent_rooms",
        "3-1) 換気室",
        row,
        vec![
            c(0, "floor"),
            c(1, "room_name"),
            c(2, "room_use_major"),
            c(3, "room_use_minor"),
            c(4, "area"),
            c(5, "vent_type"),
            c(6, "equipment_name"),
            cc(7, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0, 1, 5])
    .with_id(seq("vent_room_id", "VR"));

    let vent_fans = LayoutSpec::flat(
        "vent_fans",
        "3-2) 換気送風機",
        row,
        vec![
            c(0, "equipment_name"),
            c(1, "design_flow_m3h"),
            c(2, "motor_power_kw"),
            c(3, "high_efficiency"),
            c(4, "inverter"),
            c(5, "flow_control"),
            cc(6, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0])
    .with_id(seq("vent_fan_id", "VF"));

    let lighting_columns = vec![
        c(0, "floor"),
        c(1, "room_name"),
        c(2, "room_use_major"),
        c(3, "room_use_minor"),
        c(4, "area"),
        c(5, "floor_height"),
        c(6, "ceiling_height"),
        c(7, "room_width"),
        c(8, "room_depth"),
        c(9, "room_index"),
        c(10, "fixture_name"),
        c(11, "power_per_unit_w"),
        c(12, "quantity"),
        cc(13, "occupancy_control", NullIfBlank),
        cc(14, "daylight_control", NullIfBlank),
        cc(15, "schedule_control", NullIfBlank),
        cc(16, "initial_lumen_correction", NullIfBlank),
        cc(17, "note", EmptyIfBlank),
    ];
    let lighting_group = Group {
        parent: "lighting_rooms",
        child: "lighting",
        parent_markers: &[0, 1],
        child_markers: &[10],
        name_fields: &["floor", "room_name"],
        parent_id: "lighting_room_id",
        child_id: "lighting_id",
        context: &[
            "floor",
            "room_name",
            "room_use_major",
            "room_use_minor",
            "area",
            "ceiling_height",
        ],
        parent_row_is_child: true,
    }
    .build(
        fields_in(&lighting_columns, 0..=9),
        fields_in(&lighting_columns, 10..=17),
    );
    let lighting = LayoutSpec::flat("lighting", "4) 照明", row, lighting_columns)
        .with_grouping(lighting_group);

    let hw_room_columns = vec![
        c(0, "floor"),
        c(1, "room_name"),
        c(2, "room_use_major"),
        c(3, "room_use_minor"),
        c(4, "area"),
        c(5, "tap_location"),
        c(6, "water_saving_device"),
        c(7, "equipment_name"),
        cc(8, "note", EmptyIfBlank),
    ];
    let hw_group = Group {
        parent: "hw_rooms",
        child: "hw_taps",
        parent_markers: &[0, 1],
        child_markers: &[5],
        name_fields: &["floor", "room_name"],
        parent_id: "hw_room_id",
        child_id: "hw_tap_id",
        context: &["floor", "room_name", "room_use_major", "room_use_minor", "area"],
        parent_row_is_child: true,
    }
    .build(
        fields_in(&hw_room_columns, 0..=4),
        fields_in(&hw_room_columns, 5..=8),
    );
    let hw_rooms = LayoutSpec::flat("hot_water_rooms", "5-1) 給湯室", row, hw_room_columns)
        .with_grouping(hw_group);

    let hw_equipment = LayoutSpec::flat(
        "hw_equipment",
        "5-2) 給湯機器",
        row,
        vec![
            c(0, "equipment_name"),
            c(1, "fuel_type"),
            c(2, "heating_capacity_kw"),
            c(3, "efficiency"),
            c(4, "pipe_insulation"),
            c(5, "pipe_size_mm"),
            cc(6, "solar_collector_area_m2", NullIfBlank),
            cc(7, "collector_azimuth_deg", NullIfBlank),
            cc(8, "collector_tilt_deg", NullIfBlank),
            cc(9, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0])
    .with_id(seq("hw_equip_id", "HE"));

    let elevators = LayoutSpec::flat(
        "elevators",
        "6) 昇降機",
        row,
        vec![
            c(0, "floor"),
            c(1, "room_name"),
            c(2, "room_use_major"),
            c(3, "room_use_minor"),
            c(4, "equipment_name"),
            c(5, "quantity"),
            c(6, "load_capacity_kg"),
            c(7, "speed_m_min"),
            c(8, "transport_coefficient"),
            c(9, "speed_control"),
            cc(10, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[4])
    .with_id(seq("elevator_id", "EV"));

    let pv = LayoutSpec::flat(
        "pv",
        "7-1) 太陽光発電",
        row,
        vec![
            c(0, "system_name"),
            c(1, "pcs_efficiency"),
            c(2, "cell_type"),
            c(3, "mount_type"),
            c(4, "capacity_kw"),
            c(5, "azimuth_deg"),
            c(6, "tilt_deg"),
            cc(7, "note", EmptyIfBlank),
        ],
    )
    .with_required(&[0])
    .with_id(seq("pv_id", "PV"));

    let cogen = LayoutSpec::flat(
        "cogen",
        "7-3) コージェネレーション設備",
        row,
        vec![
            c(0, "equipment_name"),
            c(1, "rated_power_kw"),
            c(2, "quantity"),
            c(3, "power_eff_100"),
            c(4, "power_eff_75"),
            c(5, "power_eff_50"),
            c(6, "heat_eff_100"),
            c(7, "heat_eff_75"),
            c(8, "heat_eff_50"),
            cc(9, "ac_cool_priority", Priority),
            cc(10, "ac_heat_priority", Priority),
            cc(11, "hw_priority", Priority),
        ],
    )
    .with_required(&[0])
    .with_id(seq("cogen_id", "CG"));

    let non_ac_columns = vec![
        c(0, "floor"),
        c(1, "zone_name"),
        c(2, "room_use_major"),
        c(3, "room_use_minor"),
        c(4, "area"),
        c(5, "floor_height"),
        c(6, "direction"),
        c(7, "shade_coef_cool"),
        c(8, "shade_coef_heat"),
        c(9, "wall_spec_name"),
        c(10, "wall_area"),
        cc(11, "window_spec_name", NullIfBlank),
        cc(12, "window_area", NullIfBlank),
        cc(13, "blind", NullIfBlank),
        cc(14, "note", EmptyIfBlank),
    ];
    let non_ac_group = Group {
        parent: "non_ac_zones",
        child: "non_ac_envelopes",
        parent_markers: &[0, 1],
        child_markers: &[6],
        name_fields: &["floor", "zone_name"],
        parent_id: "non_ac_zone_id",
        child_id: "non_ac_envelope_id",
        context: &[
            "floor",
            "zone_name",
            "room_use_major",
            "room_use_minor",
            "area",
            "floor_height",
        ],
        parent_row_is_child: true,
    }
    .build(
        fields_in(&non_ac_columns, 0..=5),
        fields_in(&non_ac_columns, 6..=14),
    );
    let non_ac = LayoutSpec::flat("non_ac_envelope", "8) 非空調外皮", row, non_ac_columns)
        .with_grouping(non_ac_group);

    LayoutRegistry {
        basic_info: Some(BasicInfoSpec {
            sheet_name: BASIC_INFO_SHEET.to_string(),
            entity_type: Some("buildings".to_string()),
        }),
        layouts: vec![
            rooms,
            zones,
            walls,
            windows,
            envelopes,
            heat_sources,
            pumps,
            ahus,
            vent_rooms,
            vent_fans,
            lighting,
            hw_rooms,
            hw_equipment,
            elevators,
            pv,
            cogen,
            non_ac,
        ],
    }
}

/// Flat per-sheet layouts with prefixed field names, consolidated into one table
pub fn wide() -> LayoutRegistry {
    // (entity, sheet, data start row, column offset → field) per form
    let forms: Vec<(&str, &str, usize, Vec<(usize, &str)>)> = vec![
        (
            "room",
            "1) 室仕様",
            9,
            vec![
                (0, "room_floor"),
                (1, "room_name"),
                (2, "room_building_type"),
                (3, "room_type_major"),
                (4, "room_type_minor"),
                (5, "room_area"),
                (6, "room_floor_height"),
                (7, "room_ceiling_height"),
                (8, "room_is_ac_target"),
                (9, "room_is_vent_target"),
                (10, "room_is_light_target"),
                (11, "room_is_hotwater_target"),
                (12, "room_building_group"),
                (13, "room_note"),
            ],
        ),
        (
            "zone",
            "2-1) 空調ゾーン",
            9,
            vec![
                (0, "zone_floor"),
                (1, "zone_room_name"),
                (2, "zone_room_type_major"),
                (3, "zone_room_type_minor"),
                (4, "zone_room_area"),
                (5, "zone_floor_height"),
                (6, "zone_ceiling_height"),
                (7, "zone_ac_floor"),
                (8, "zone_name"),
                (9, "zone_ahu_group_room"),
                (10, "zone_ahu_group_oa"),
                // 11-13 hold the room-use pick lists
                (14, "zone_note"),
            ],
        ),
        (
            "wall",
            "2-2) 外壁構成 ",
            9,
            vec![
                (0, "wall_name"),
                (1, "wall_type"),
                (2, "wall_u_value"),
                (3, "wall_material_no"),
                (4, "wall_material_name"),
                (5, "wall_conductivity"),
                (6, "wall_thickness"),
                (7, "wall_solar_absorption"),
                (8, "wall_note"),
            ],
        ),
        (
            "window",
            "2-3) 窓仕様",
            9,
            vec![
                (0, "window_name"),
                (1, "window_u_value"),
                (2, "window_eta_value"),
                (3, "window_frame_type"),
                (4, "window_glass_type"),
                (5, "window_glass_u_value"),
                (6, "window_glass_eta_value"),
                (7, "window_note"),
            ],
        ),
        (
            "envelope",
            "2-4) 外皮 ",
            9,
            vec![
                (0, "env_floor"),
                (1, "env_zone_name"),
                (2, "env_direction"),
                (3, "env_shade_coef_cooling"),
                (4, "env_shade_coef_heating"),
                (5, "env_wall_name"),
                (6, "env_wall_area"),
                (7, "env_window_name"),
                (8, "env_window_area"),
                (9, "env_has_blind"),
                (10, "env_note"),
            ],
        ),
        (
            "heatsource",
            "2-5) 熱源",
            9,
            vec![
                (0, "hs_group_name"),
                (1, "hs_simultaneous"),
                (2, "hs_staging_control"),
                (3, "hs_operation_mode"),
                (4, "hs_storage_capacity"),
                (5, "hs_type"),
                (6, "hs_cooling_order"),
                (7, "hs_cooling_count"),
                (8, "hs_cooling_supply_temp"),
                (9, "hs_cooling_capacity"),
                (10, "hs_cooling_main_power"),
                (11, "hs_cooling_sub_power"),
                (12, "hs_cooling_pump_power"),
                (13, "hs_ct_capacity"),
                (14, "hs_ct_fan_power"),
                (15, "hs_ct_pump_power"),
                (16, "hs_heating_order"),
                (17, "hs_heating_count"),
                (18, "hs_heating_supply_temp"),
                (19, "hs_heating_capacity"),
                (20, "hs_heating_main_power"),
                (21, "hs_heating_sub_power"),
                (22, "hs_heating_pump_power"),
                (23, "hs_note"),
            ],
        ),
        (
            "pump",
            "2-6) 2次ﾎﾟﾝﾌﾟ",
            9,
            vec![
                (0, "pump_group_name"),
                (1, "pump_staging_control"),
                (2, "pump_cooling_temp_diff"),
                (3, "pump_heating_temp_diff"),
                (4, "pump_order"),
                (5, "pump_count"),
                (6, "pump_rated_flow"),
                (7, "pump_rated_power"),
                (8, "pump_flow_control"),
                (9, "pump_min_flow_ratio"),
                (10, "pump_note"),
            ],
        ),
        (
            "ahu",
            "2-7) 空調機",
            9,
            vec![
                (0, "ahu_group_name"),
                (1, "ahu_count"),
                (2, "ahu_type"),
                (3, "ahu_cooling_capacity"),
                (4, "ahu_heating_capacity"),
                (5, "ahu_oa_flow"),
                (6, "ahu_sa_fan_power"),
                (7, "ahu_ra_fan_power"),
                (8, "ahu_oa_fan_power"),
                (9, "ahu_ea_fan_power"),
                (10, "ahu_air_flow_control"),
                (11, "ahu_min_air_ratio"),
                (12, "ahu_preheat_oa_stop"),
                (13, "ahu_economizer"),
                (14, "ahu_has_hex"),
                (15, "ahu_hex_name"),
                (16, "ahu_hex_flow"),
                (17, "ahu_hex_eff_cooling"),
                (18, "ahu_hex_eff_heating"),
                (19, "ahu_auto_bypass"),
                (20, "ahu_rotor_power"),
                (21, "ahu_pump_group_cooling"),
                (22, "ahu_pump_group_heating"),
                (23, "ahu_hs_group_cooling"),
                (24, "ahu_hs_group_heating"),
                (25, "ahu_note"),
            ],
        ),
        (
            "hs_water_temp",
            "2-8) 熱源水温度",
            9,
            vec![
                (0, "hswt_group_name"),
                (1, "hswt_temp_jan"),
                (2, "hswt_temp_feb"),
                (3, "hswt_temp_mar"),
                (4, "hswt_temp_apr"),
                (5, "hswt_temp_may"),
                (6, "hswt_temp_jun"),
                (7, "hswt_temp_jul"),
                (8, "hswt_temp_aug"),
                (9, "hswt_temp_sep"),
                (10, "hswt_temp_oct"),
                (11, "hswt_temp_nov"),
                (12, "hswt_temp_dec"),
            ],
        ),
        (
            "heat_exchanger",
            "2-9) 全熱交換器",
            9,
            vec![
                (0, "hex_name"),
                (1, "hex_type"),
                (2, "hex_oa_flow"),
                (3, "hex_ea_flow"),
                (4, "hex_count"),
                (5, "hex_eff_cooling_1"),
                (6, "hex_eff_heating_1"),
                (7, "hex_test_sa_flow_1"),
                (8, "hex_test_ra_flow_1"),
                (9, "hex_vent_eff_1"),
                (10, "hex_eff_cooling_2"),
                (11, "hex_eff_heating_2"),
                (12, "hex_test_sa_flow_2"),
                (13, "hex_test_ra_flow_2"),
                (14, "hex_vent_eff_2"),
                (15, "hex_eff_cooling_3"),
                (16, "hex_eff_heating_3"),
                (17, "hex_test_sa_flow_3"),
                (18, "hex_test_ra_flow_3"),
                (19, "hex_vent_eff_3"),
            ],
        ),
        (
            "vwv_pump",
            "2-10) 変流量二次ポンプシステム",
            8,
            vec![
                (0, "vwv_group_name"),
                (1, "vwv_cooling_temp_diff"),
                (2, "vwv_heating_temp_diff"),
                (3, "vwv_rated_flow"),
                (4, "vwv_rated_power"),
                (5, "vwv_min_flow_ratio"),
                (6, "vwv_coef_3rd"),
                (7, "vwv_coef_2nd"),
                (8, "vwv_coef_1st"),
                (9, "vwv_coef_const"),
            ],
        ),
        (
            "pac_partial",
            "2-11) パッケージエアコンディショナ(空冷式)部分負荷特性",
            5,
            vec![
                (0, "pac_hs_name"),
                (1, "pac_cooling_coef_2nd"),
                (2, "pac_cooling_coef_1st"),
                (3, "pac_cooling_const"),
                (4, "pac_cooling_min_output"),
                (5, "pac_heating_coef_2nd"),
                (6, "pac_heating_coef_1st"),
                (7, "pac_heating_const"),
                (8, "pac_heating_min_output"),
            ],
        ),
        (
            "vent_room",
            "3-1) 換気室",
            9,
            vec![
                (0, "vr_floor"),
                (1, "vr_room_name"),
                (2, "vr_room_type_major"),
                (3, "vr_room_type_minor"),
                (4, "vr_room_area"),
                (5, "vr_vent_type"),
                (6, "vr_vent_equip_name"),
                (7, "vr_note"),
            ],
        ),
        (
            "vent_fan",
            "3-2) 換気送風機",
            9,
            vec![
                (0, "vf_equip_name"),
                (1, "vf_design_flow"),
                (2, "vf_motor_power"),
                (3, "vf_high_eff_motor"),
                (4, "vf_has_inverter"),
                (5, "vf_flow_control"),
                (6, "vf_note"),
            ],
        ),
        (
            "vent_ahu",
            "3-3) 換気空調機",
            8,
            vec![
                (0, "va_equip_name"),
                (1, "va_room_type"),
                (2, "va_cooling_capacity"),
                (3, "va_hs_efficiency"),
                (4, "va_pump_power"),
                (5, "va_fan_type"),
                (6, "va_design_flow"),
                (7, "va_motor_power"),
                (8, "va_high_eff_motor"),
                (9, "va_has_inverter"),
                (10, "va_flow_control"),
                (11, "va_note"),
            ],
        ),
        (
            "vent_load_rate",
            "3-4) 年間平均負荷率",
            9,
            vec![
                (0, "vlr_equip_name"),
                (1, "vlr_annual_load_rate"),
                (2, "vlr_note"),
            ],
        ),
        (
            "lighting",
            "4) 照明",
            9,
            vec![
                (0, "lt_floor"),
                (1, "lt_room_name"),
                (2, "lt_room_type_major"),
                (3, "lt_room_type_minor"),
                (4, "lt_room_area"),
                (5, "lt_floor_height"),
                (6, "lt_ceiling_height"),
                (7, "lt_room_width"),
                (8, "lt_room_depth"),
                (9, "lt_room_index"),
                (10, "lt_fixture_name"),
                (11, "lt_fixture_power"),
                (12, "lt_fixture_count"),
                (13, "lt_occupancy_control"),
                (14, "lt_daylight_control"),
                (15, "lt_schedule_control"),
                (16, "lt_initial_correction"),
                (17, "lt_note"),
            ],
        ),
        (
            "hotwater_room",
            "5-1) 給湯室",
            9,
            vec![
                (0, "hwr_floor"),
                (1, "hwr_room_name"),
                (2, "hwr_room_type_major"),
                (3, "hwr_room_type_minor"),
                (4, "hwr_room_area"),
                (5, "hwr_supply_location"),
                (6, "hwr_water_saving"),
                (7, "hwr_equip_name"),
                (8, "hwr_note"),
            ],
        ),
        (
            "hotwater_equip",
            "5-2) 給湯機器",
            9,
            vec![
                (0, "hwe_equip_name"),
                (1, "hwe_fuel_type"),
                (2, "hwe_heating_capacity"),
                (3, "hwe_efficiency"),
                (4, "hwe_insulation"),
                (5, "hwe_pipe_diameter"),
                (6, "hwe_solar_area"),
                (7, "hwe_solar_azimuth"),
                (8, "hwe_solar_tilt"),
                (9, "hwe_note"),
            ],
        ),
        (
            "elevator",
            "6) 昇降機",
            9,
            vec![
                (0, "ev_floor"),
                (1, "ev_room_name"),
                (2, "ev_room_type_major"),
                (3, "ev_room_type_minor"),
                (4, "ev_equip_name"),
                (5, "ev_count"),
                (6, "ev_capacity"),
                (7, "ev_speed"),
                (8, "ev_transport_coef"),
                (9, "ev_control_type"),
                (10, "ev_note"),
            ],
        ),
        (
            "pv",
            "7-1) 太陽光発電",
            9,
            vec![
                (0, "pv_system_name"),
                (1, "pv_pcs_efficiency"),
                (2, "pv_cell_type"),
                (3, "pv_install_type"),
                (4, "pv_capacity"),
                (5, "pv_azimuth"),
                (6, "pv_tilt"),
                (7, "pv_note"),
            ],
        ),
        (
            "cgs",
            "7-3) コージェネレーション設備",
            8,
            vec![
                (0, "cgs_name"),
                (1, "cgs_rated_output"),
                (2, "cgs_count"),
                (3, "cgs_gen_eff_100"),
                (4, "cgs_gen_eff_75"),
                (5, "cgs_gen_eff_50"),
                (6, "cgs_heat_eff_100"),
                (7, "cgs_heat_eff_75"),
                (8, "cgs_heat_eff_50"),
                (9, "cgs_priority_ac_cool"),
                (10, "cgs_priority_ac_heat"),
                (11, "cgs_priority_hotwater"),
                (12, "cgs_24h_operation"),
                (13, "cgs_ac_cool_hs_group"),
                (14, "cgs_ac_heat_hs_group"),
                (15, "cgs_hotwater_equip"),
                (16, "cgs_note"),
            ],
        ),
        (
            "envelope_non_ac",
            "8) 非空調外皮",
            9,
            vec![
                (0, "nac_floor"),
                (1, "nac_zone_name"),
                (2, "nac_room_type_major"),
                (3, "nac_room_type_minor"),
                (4, "nac_room_area"),
                (5, "nac_floor_height"),
                (6, "nac_direction"),
                (7, "nac_shade_coef_cooling"),
                (8, "nac_shade_coef_heating"),
                (9, "nac_wall_name"),
                (10, "nac_wall_area"),
                (11, "nac_window_name"),
                (12, "nac_window_area"),
                (13, "nac_has_blind"),
                (14, "nac_note"),
            ],
        ),
    ];

    let layouts = forms
        .into_iter()
        .map(|(entity, sheet, start, columns)| {
            let columns = columns.into_iter().map(|(idx, field)| c(idx, field)).collect();
            LayoutSpec::flat(entity, sheet, start, columns)
        })
        .collect();

    LayoutRegistry {
        basic_info: Some(BasicInfoSpec {
            sheet_name: BASIC_INFO_SHEET.to_string(),
            entity_type: None,
        }),
        layouts,
    }
}

/// Whole-sheet consolidation: column names come from the sheet's own header rows
pub fn sheet_dump() -> LayoutRegistry {
    // (sheet, output sheet, header row, data start row, width); units on row 7
    let sheets: [(&str, &str, usize, usize, usize); 19] = [
        ("1) 室仕様", "01_室仕様", 5, 9, 14),
        ("2-1) 空調ゾーン", "02_空調ゾーン", 5, 9, 12),
        ("2-2) 外壁構成 ", "03_外壁構成", 4, 9, 9),
        ("2-3) 窓仕様", "04_窓仕様", 4, 9, 8),
        ("2-4) 外皮 ", "05_外皮", 5, 9, 10),
        ("2-5) 熱源", "06_熱源", 5, 9, 24),
        ("2-6) 2次ﾎﾟﾝﾌﾟ", "07_二次ポンプ", 4, 9, 10),
        ("2-7) 空調機", "08_空調機", 5, 9, 24),
        ("2-9) 全熱交換器", "09_全熱交換器", 5, 9, 18),
        ("3-1) 換気室", "10_換気室", 5, 9, 7),
        ("3-2) 換気送風機", "11_換気送風機", 5, 9, 6),
        ("3-3) 換気空調機", "12_換気空調機", 5, 8, 11),
        ("4) 照明", "13_照明", 5, 9, 17),
        ("5-1) 給湯室", "14_給湯室", 5, 9, 8),
        ("5-2) 給湯機器", "15_給湯機器", 5, 9, 9),
        ("6) 昇降機", "16_昇降機", 5, 9, 10),
        ("7-1) 太陽光発電", "17_太陽光発電", 5, 9, 7),
        ("7-3) コージェネレーション設備", "18_コージェネ", 5, 8, 16),
        ("8) 非空調外皮", "19_非空調外皮", 5, 9, 14),
    ];
    const UNIT_ROW: usize = 7;

    let layouts = sheets
        .iter()
        .map(|&(sheet, output, header_row, data_start, width)| {
            // A units row at or past the data start row would be a data row
            let unit_row = (UNIT_ROW < data_start).then_some(UNIT_ROW);
            LayoutSpec::flat(output, sheet, data_start, Vec::new()).with_header_fusion(
                HeaderFusion {
                    header_row,
                    unit_row,
                    width,
                },
            )
        })
        .collect();

    LayoutRegistry {
        basic_info: Some(BasicInfoSpec {
            sheet_name: BASIC_INFO_SHEET.to_string(),
            entity_type: Some("00_基本情報".to_string()),
        }),
        layouts,
    }
}
