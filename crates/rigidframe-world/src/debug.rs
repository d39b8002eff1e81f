use crate::World;

impl World {
    pub(crate) fn print_debug_block(&self) {
        println!("--- debug @ tick {}  active={}  pairs={}  contacts={} ---",
                 self.tick, self.last_stats.active_bodies, self.last_stats.pairs_tested, self.last_stats.contacts);

        if self.debug.show_energy {
            let g = self.settings.gravity;
            let (mut ke, mut pe) = (0.0f32, 0.0f32);
            for (_, b) in self.bodies.iter().filter(|(_, b)| b.is_in_world() && b.is_dynamic()) {
                let m = b.mass();
                ke += 0.5 * m * b.linear_velocity().length_squared();
                ke += 0.5 * b.angular_velocity().dot(b.inertia_world() * b.angular_velocity());
                pe -= m * g.dot(b.position());
            }
            println!("energy: KE={:.6}  PE={:.6}  total={:.6}", ke, pe, ke + pe);
        }

        if self.debug.show_bodies {
            for (id, b) in self.bodies.iter().take(self.debug.max_lines) {
                let p = b.position();
                let v = b.linear_velocity();
                println!("{:<14} pos=({:+.3},{:+.3},{:+.3})  vel=({:+.3},{:+.3},{:+.3})  {}",
                         id.to_string(), p.x, p.y, p.z, v.x, v.y, v.z,
                         if b.is_active() { "awake" } else { "asleep" });
            }
        }

        if self.debug.show_contacts {
            if self.contacts.is_empty() {
                println!("contacts: (none)");
            } else {
                for c in self.contacts.iter().take(self.debug.max_lines) {
                    println!("contact {} {}  n=({:+.3},{:+.3},{:+.3})  depth={:.5}",
                             c.a, c.b, c.normal.x, c.normal.y, c.normal.z, c.depth);
                }
            }
        }
    }
}
