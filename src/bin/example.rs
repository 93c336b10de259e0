use dynamic_connectivity::{EdgeRef, FastSpanningForest, NodeRef};

type Net = FastSpanningForest<&'static str, u32>;

fn link(net: &mut Net, u: NodeRef, v: NodeRef, length: u32) -> EdgeRef {
    println!("Laying a {length}km cable from {} to {}", net.node(u), net.node(v));
    net.create_edge(u, v, length).0
}

fn cut(net: &mut Net, e: EdgeRef) {
    let (u, v) = net.ends(e);
    let (length, split) = net.delete_edge(e);
    println!(
        "Cutting the {length}km cable from {} to {}{}",
        net.node(u),
        net.node(v),
        if split { ", splitting the network" } else { "" }
    );
}

fn report(net: &Net, u: NodeRef) {
    let members: Vec<_> = net.cluster(u).map(|v| *net.node(v)).collect();
    println!(
        "{} can reach {} site(s): {}",
        net.node(u),
        net.cluster_size(u),
        members.join(", ")
    );
}

fn main() {
    let mut net = Net::new();
    let sites: Vec<_> = ["oslo", "bergen", "trondheim", "tromso", "stavanger"]
        .into_iter()
        .map(|name| net.add_node(name))
        .collect();
    let mut cables = vec![];
    for w in sites.windows(2) {
        cables.push(link(&mut net, w[0], w[1], 100));
    }
    // A redundant cable between the two ends of the chain
    let ring = link(&mut net, sites[0], sites[4], 250);
    report(&net, sites[0]);

    cut(&mut net, cables[1]);
    println!("Still one network thanks to the redundant cable:");
    report(&net, sites[0]);

    cut(&mut net, ring);
    report(&net, sites[0]);
    report(&net, sites[4]);
}
