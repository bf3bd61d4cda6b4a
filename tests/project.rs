use gatenet::{GateDef, GateRegistry, Metadata, Netlist, Project, Simulator};

/// SR latch from two NORs: Q = !(R | Qn), Qn = !(S | Q).
fn sr_latch(registry: &GateRegistry) -> Netlist {
    let mut netlist = Netlist::new();
    let s = netlist.add_input("S");
    let r = netlist.add_input("R");
    let q = netlist.add_output("Q");
    let qn = netlist.add_output("Qn");
    let nor0 = netlist.place(registry.resolve("NOR").unwrap());
    let nor1 = netlist.place(registry.resolve("NOR").unwrap());
    netlist.link(nor0, 0, r, 0).unwrap();
    netlist.link(nor0, 1, nor1, 0).unwrap();
    netlist.link(nor1, 0, s, 0).unwrap();
    netlist.link(nor1, 1, nor0, 0).unwrap();
    netlist.link(q, 0, nor0, 0).unwrap();
    netlist.link(qn, 0, nor1, 0).unwrap();
    netlist
}

#[test]
fn saved_project_rehydrates_into_equivalent_gates() {
    let registry = GateRegistry::with_primitives();
    let mut metadata = Metadata::new();
    metadata.insert("color".to_owned(), "#00ff00".into());
    let project = Project {
        gates: vec![GateDef::from_netlist("SR", &sr_latch(&registry), metadata)],
    };
    let mut json = vec![];
    project.to_writer(&mut json).unwrap();
    let reloaded = Project::from_reader(json.as_slice()).unwrap();
    assert_eq!(reloaded, project);

    let mut registry = GateRegistry::with_primitives();
    let gates = reloaded.load_into(&mut registry).unwrap();
    let sr = registry.resolve("SR").unwrap();
    assert!(std::sync::Arc::ptr_eq(&gates[0], &sr));
    assert!(sr.is_hierarchical());
    assert_eq!(sr.color(), Some("#00ff00"));
    assert_eq!(sr.inputs, vec!["S", "R"]);
    assert_eq!(sr.outputs, vec!["Q", "Qn"]);

    let mut top = Netlist::new();
    let s = top.add_input("S");
    let r = top.add_input("R");
    let q = top.add_output("Q");
    let node = top.place(sr);
    top.link(node, 0, s, 0).unwrap();
    top.link(node, 1, r, 0).unwrap();
    top.link(q, 0, node, 0).unwrap();
    let mut sim = Simulator::new(top);
    sim.drive(s, true).unwrap();
    for _ in 0..3 {
        sim.tick();
    }
    assert!(sim.read_pin(q));
    sim.drive(s, false).unwrap();
    for _ in 0..3 {
        sim.tick();
        assert!(sim.read_pin(q));
    }
    sim.drive(r, true).unwrap();
    for _ in 0..3 {
        sim.tick();
    }
    assert!(!sim.read_pin(q));
}

#[test]
fn project_gates_can_be_placed_by_later_gates() {
    let json = r#"{"gates": [
        {
            "name": "TWO NOTS",
            "nodes": [{"gateTypeName": "INV"}, {"gateTypeName": "INV"}],
            "links": [
                {"node": null, "index": 0, "to": 0, "inIndex": 0},
                {"node": 0, "index": 0, "to": 1, "inIndex": 0},
                {"node": 1, "index": 0, "to": null, "inIndex": 0}
            ],
            "inputs": [{"name": "A"}],
            "outputs": [{"name": "Q"}]
        },
        {
            "name": "INV",
            "nodes": [{"gateTypeName": "NAND"}],
            "links": [
                {"node": null, "index": 0, "to": 0, "inIndex": 0},
                {"node": null, "index": 0, "to": 0, "inIndex": 1},
                {"node": 0, "index": 0, "to": null, "inIndex": 0}
            ],
            "inputs": [{"name": "A"}],
            "outputs": [{"name": "Q"}]
        }
    ]}"#;
    let project = Project::from_reader(json.as_bytes()).unwrap();
    let mut registry = GateRegistry::with_primitives();
    project.load_into(&mut registry).unwrap();
    let two_nots = registry.resolve("TWO NOTS").unwrap();
    assert_eq!(
        two_nots.truth_table().unwrap(),
        vec![vec![false], vec![true]]
    );
    // Loading again collides with the registered gates.
    assert!(project.load_into(&mut registry).is_err());
}
